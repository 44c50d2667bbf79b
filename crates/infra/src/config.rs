//! Configuration loading and representation.
//!
//! | variable                      | default      |
//! |-------------------------------|--------------|
//! | `SCHOOLERP_SCOPING`           | `transitive` |
//! | `SCHOOLERP_ACCESS_TTL_SECS`   | `300`        |
//! | `SCHOOLERP_REFRESH_TTL_SECS`  | `86400`      |
//! | `SCHOOLERP_POLICY_FILE`       | unset (standard policy) |

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use schoolerp_auth::{AccessDecisionEngine, AuthzStore, PolicyTable, ScopingMode, TokenLifetimes};

use crate::service::RecordService;
use crate::store::SchoolStore;

pub const ENV_SCOPING: &str = "SCHOOLERP_SCOPING";
pub const ENV_ACCESS_TTL: &str = "SCHOOLERP_ACCESS_TTL_SECS";
pub const ENV_REFRESH_TTL: &str = "SCHOOLERP_REFRESH_TTL_SECS";
pub const ENV_POLICY_FILE: &str = "SCHOOLERP_POLICY_FILE";

/// Upper bound on either token lifetime: ten years.
pub const MAX_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },

    #[error("failed to read policy file {path}: {source}")]
    PolicyFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Settings of the authorization core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthzConfig {
    pub scoping: ScopingMode,
    pub access_ttl_secs: u64,
    pub refresh_ttl_secs: u64,
    /// Replaces the standard policy table when set.
    pub policy: Option<PolicyTable>,
}

impl Default for AuthzConfig {
    fn default() -> Self {
        Self {
            scoping: ScopingMode::Transitive,
            access_ttl_secs: 5 * 60,
            refresh_ttl_secs: 24 * 60 * 60,
            policy: None,
        }
    }
}

impl AuthzConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_SCOPING) {
            config.scoping = raw.parse().map_err(|e: schoolerp_core::DomainError| {
                ConfigError::InvalidValue {
                    key: ENV_SCOPING,
                    message: e.to_string(),
                }
            })?;
        }
        if let Some(raw) = lookup(ENV_ACCESS_TTL) {
            config.access_ttl_secs = parse_ttl(ENV_ACCESS_TTL, &raw)?;
        }
        if let Some(raw) = lookup(ENV_REFRESH_TTL) {
            config.refresh_ttl_secs = parse_ttl(ENV_REFRESH_TTL, &raw)?;
        }
        if let Some(path) = lookup(ENV_POLICY_FILE) {
            config.policy = Some(read_policy_file(Path::new(&path))?);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_json(document: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(document)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.access_ttl_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: ENV_ACCESS_TTL,
                message: "must be positive".to_string(),
            });
        }
        for (key, secs) in [
            (ENV_ACCESS_TTL, self.access_ttl_secs),
            (ENV_REFRESH_TTL, self.refresh_ttl_secs),
        ] {
            if secs > MAX_TTL_SECS {
                return Err(ConfigError::InvalidValue {
                    key,
                    message: format!("{secs}s exceeds the maximum of {MAX_TTL_SECS}s"),
                });
            }
        }
        if self.refresh_ttl_secs <= self.access_ttl_secs {
            return Err(ConfigError::InvalidValue {
                key: ENV_REFRESH_TTL,
                message: format!(
                    "must exceed the access token lifetime of {}s",
                    self.access_ttl_secs
                ),
            });
        }
        Ok(())
    }

    pub fn token_lifetimes(&self) -> Result<TokenLifetimes, ConfigError> {
        Ok(TokenLifetimes {
            access: ttl(ENV_ACCESS_TTL, self.access_ttl_secs)?,
            refresh: ttl(ENV_REFRESH_TTL, self.refresh_ttl_secs)?,
        })
    }

    pub fn policy_table(&self) -> PolicyTable {
        self.policy.clone().unwrap_or_default()
    }

    pub fn engine<S: AuthzStore>(&self, store: S) -> AccessDecisionEngine<S> {
        AccessDecisionEngine::new(store)
            .with_policy(self.policy_table())
            .with_scoping(self.scoping)
    }

    pub fn record_service(&self, store: Arc<SchoolStore>) -> RecordService {
        RecordService::new(self.engine(store))
    }
}

fn parse_ttl(key: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim().parse::<u64>().map_err(|e| ConfigError::InvalidValue {
        key,
        message: format!("'{raw}' is not a number of seconds ({e})"),
    })
}

fn ttl(key: &'static str, secs: u64) -> Result<Duration, ConfigError> {
    i64::try_from(secs)
        .ok()
        .and_then(Duration::try_seconds)
        .ok_or_else(|| ConfigError::InvalidValue {
            key,
            message: format!("{secs}s is not a representable duration"),
        })
}

fn read_policy_file(path: &Path) -> Result<PolicyTable, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::PolicyFile {
        path: path.display().to_string(),
        source,
    })?;
    Ok(serde_json::from_str(&raw)?)
}

/// Load configuration from the process environment (binary entry points).
pub fn load() -> anyhow::Result<AuthzConfig> {
    AuthzConfig::from_env().context("loading authorization configuration")
}
