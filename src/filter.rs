// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Decides which proxied responses are worth capturing.

use crate::config::InterceptConfig;
use tracing::{debug, info};

/// Host/path suffix predicate consulted before a response body is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterceptFilter {
    domain_suffix: String,
    path_suffix: String,
}

impl InterceptFilter {
    pub fn new(domain_suffix: impl Into<String>, path_suffix: impl Into<String>) -> Self {
        Self {
            domain_suffix: domain_suffix.into(),
            path_suffix: path_suffix.into(),
        }
    }

    pub fn from_config(cfg: &InterceptConfig) -> Self {
        Self::new(cfg.domain_suffix.clone(), cfg.path_suffix.clone())
    }

    /// True when both the host and the path end with the configured suffixes.
    pub fn should_capture(&self, host: &str, path: &str) -> bool {
        debug!(%host, %path, "evaluating response");
        let accepted = host.ends_with(&self.domain_suffix) && path.ends_with(&self.path_suffix);
        if accepted {
            info!(%host, %path, "response selected for capture");
        }
        accepted
    }
}
