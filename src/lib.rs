// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! HTTP forward proxy that captures game responses and turns the chips they
//! carry into a compact chip code.
//!
//! Selected responses are copied onto a bounded dispatch queue, decoded by
//! concurrent workers, filtered through the inclusion rules and encoded. The
//! resulting code is logged and copied to the clipboard.

pub mod capture;
pub mod codec;
pub mod config;
pub mod dispatch;
pub mod dump;
pub mod error;
pub mod extract;
pub mod filter;
pub mod logging;
pub mod pipeline;
pub mod proxy;
pub mod publish;
pub mod rules;
pub mod worker;

mod serde_helpers;

#[cfg(test)]
mod test_helpers;
