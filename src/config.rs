// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Configuration loading and validation.

use crate::error::ConfigError;
use crate::rules::RuleSet;
use crate::serde_helpers::string_or_number_seq;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct GeneralConfig {
    /// Listen address, e.g. 0.0.0.0:8080
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Directory receiving the session log file
    #[serde(default = "default_dir")]
    pub log_dir: String,

    /// Directory receiving raw response dumps when `verbose` is on
    #[serde(default = "default_dir")]
    pub dump_dir: String,

    /// Number of captures that may wait for dispatch before producers block
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_listen() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_dir() -> String {
    ".".to_string()
}

fn default_queue_capacity() -> usize {
    128
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            log_dir: default_dir(),
            dump_dir: default_dir(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct InterceptConfig {
    #[serde(default = "default_domain_suffix")]
    pub domain_suffix: String,
    #[serde(default = "default_path_suffix")]
    pub path_suffix: String,
}

fn default_domain_suffix() -> String {
    "ppgame.com".to_string()
}

fn default_path_suffix() -> String {
    "/Index/index".to_string()
}

impl Default for InterceptConfig {
    fn default() -> Self {
        Self {
            domain_suffix: default_domain_suffix(),
            path_suffix: default_path_suffix(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TlsConfig {
    /// Tunnel CONNECT requests untouched. When false they are refused.
    #[serde(default = "default_passthrough")]
    pub passthrough: bool,
}

fn default_passthrough() -> bool {
    true
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            passthrough: default_passthrough(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// Dump every captured body to disk before processing
    #[serde(default)]
    pub verbose: bool,

    /// Ordered inclusion rule codes
    #[serde(default = "default_rule", deserialize_with = "string_or_number_seq")]
    pub rule: Vec<String>,

    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub intercept: InterceptConfig,

    #[serde(default)]
    pub tls: TlsConfig,
}

fn default_rule() -> Vec<String> {
    vec!["02".to_string()]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            verbose: false,
            rule: default_rule(),
            general: GeneralConfig::default(),
            intercept: InterceptConfig::default(),
            tls: TlsConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML (`.yaml`/`.yml`) or TOML file.
    ///
    /// Example:
    ///
    /// ```yaml
    /// verbose: true
    /// rule: ["12"]
    /// intercept:
    ///   domain_suffix: ppgame.com
    /// ```
    ///
    /// Read and parse failures are returned as-is so the caller can fall back
    /// to defaults. Rule validation is left to [`Config::validate`].
    pub async fn load_from_path<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let s = tokio::fs::read_to_string(path_ref).await?;
        Self::parse(&s, path_ref)
    }

    fn parse(s: &str, path: &Path) -> anyhow::Result<Self> {
        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        let cfg = if is_yaml {
            serde_yaml::from_str(s)?
        } else {
            toml::from_str(s)?
        };
        Ok(cfg)
    }

    /// Check the values that must be right before anything starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rule_set()?;
        if self.general.queue_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(())
    }

    pub fn rule_set(&self) -> Result<RuleSet, ConfigError> {
        RuleSet::parse(&self.rule)
    }
}
