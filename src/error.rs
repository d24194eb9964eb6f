// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Error types shared across the capture pipeline.
//!
//! Only `ConfigError` is fatal. Everything else stays local to one capture,
//! one batch or one record and ends up as a log line.

use thiserror::Error;

/// Startup-time configuration problems. The process refuses to start on these.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid rule code {code:?} at position {index}: expected two digits from 0-2")]
    InvalidRule { index: usize, code: String },

    #[error("general.queue_capacity must be greater than zero")]
    ZeroCapacity,
}

/// The dispatch queue could not accept a message.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("dispatch queue is closed")]
    Closed,
}

/// The captured body is not a valid envelope. The whole batch is discarded.
#[derive(Debug, Error)]
#[error("failed to decode response envelope: {0}")]
pub struct DecodeError(#[from] pub serde_json::Error);

/// Failure while turning one record into the encoder's item type.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    /// The record is of a kind the decoder does not know. Only this record is skipped.
    #[error("unknown record kind: {0}")]
    Unknown(String),

    /// The record is malformed. The batch it belongs to is aborted.
    #[error("invalid record: {0}")]
    Invalid(String),
}

impl RecordError {
    pub fn is_unknown(&self) -> bool {
        matches!(self, RecordError::Unknown(_))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("failed to encode artifact: {0}")]
pub struct EncodeError(pub String);

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("clipboard unavailable: {0}")]
    Unavailable(String),

    #[error("clipboard write failed: {0}")]
    Write(String),
}

/// The upstream response body could not be read in full.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("failed to read response body: {0}")]
    BodyRead(Box<dyn std::error::Error + Send + Sync>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_rule_message_names_code_and_position() {
        let e = ConfigError::InvalidRule {
            index: 2,
            code: "31".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("\"31\""));
        assert!(msg.contains("position 2"));
    }

    #[test]
    fn unknown_record_error_is_recoverable() {
        assert!(RecordError::Unknown("grid 99".into()).is_unknown());
        assert!(!RecordError::Invalid("bad level".into()).is_unknown());
    }

    #[test]
    fn decode_error_wraps_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let e = DecodeError::from(json_err);
        assert!(e.to_string().starts_with("failed to decode response envelope"));
    }
}
