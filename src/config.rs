//! # Configuration
//!
//! [`AppConfig`] is read from a TOML file and then overridden by environment
//! variables, so secrets never have to live in the file.
//!
//! ```toml
//! api_url = "https://project.example.co/rest/v1"
//! api_key = "public-anon-key"
//! page_size = 10
//! debounce_ms = 500
//! require_token = false
//! request_timeout_secs = 30
//! ```
//!
//! | Variable | Overrides |
//! |---|---|
//! | `HEALTH_ADMIN_API_URL` | `api_url` |
//! | `HEALTH_ADMIN_API_KEY` | `api_key` |
//! | `HEALTH_ADMIN_ACCESS_TOKEN` | `access_token` |

use resource_list::{ListSettings, MissingTokenPolicy, RestConfig};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_API_URL: &str = "HEALTH_ADMIN_API_URL";
pub const ENV_API_KEY: &str = "HEALTH_ADMIN_API_KEY";
pub const ENV_ACCESS_TOKEN: &str = "HEALTH_ADMIN_ACCESS_TOKEN";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Missing setting: {0}")]
    Missing(&'static str),
    #[error("Invalid setting {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Settings of the admin front-end.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api_url: String,
    pub api_key: String,
    /// Service token used when nobody signs in interactively.
    pub access_token: Option<String>,
    pub page_size: u32,
    pub debounce_ms: u64,
    /// Refuse to send requests without an access token.
    pub require_token: bool,
    /// No timeout when unset.
    pub request_timeout_secs: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            api_key: String::new(),
            access_token: None,
            page_size: 10,
            debounce_ms: 500,
            require_token: false,
            request_timeout_secs: None,
        }
    }
}

impl AppConfig {
    /// Loads `path` (or the defaults when `None`) and applies the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_toml_str(&contents)?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Applies overrides from `lookup`; empty values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(url) = value(ENV_API_URL) {
            self.api_url = url;
        }
        if let Some(key) = value(ENV_API_KEY) {
            self.api_key = key;
        }
        if let Some(token) = value(ENV_ACCESS_TOKEN) {
            self.access_token = Some(token);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::Invalid {
                field: "page_size",
                reason: "must be at least 1",
            });
        }
        if self.request_timeout_secs == Some(0) {
            return Err(ConfigError::Invalid {
                field: "request_timeout_secs",
                reason: "must be at least 1 when set",
            });
        }
        Ok(())
    }

    pub fn list_settings(&self) -> ListSettings {
        ListSettings {
            page_size: self.page_size,
            debounce: Duration::from_millis(self.debounce_ms),
            ..ListSettings::default()
        }
    }

    /// Connection settings for the REST backend.
    pub fn rest_config(&self) -> Result<RestConfig, ConfigError> {
        if self.api_url.trim().is_empty() {
            return Err(ConfigError::Missing("api_url"));
        }
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::Missing("api_key"));
        }
        let mut rest = RestConfig::new(self.api_url.trim(), self.api_key.trim());
        rest.missing_token = if self.require_token {
            MissingTokenPolicy::Reject
        } else {
            MissingTokenPolicy::SendAnonymous
        };
        rest.timeout = self.request_timeout_secs.map(Duration::from_secs);
        Ok(rest)
    }
}
