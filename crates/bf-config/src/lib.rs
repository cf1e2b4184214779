// SPDX-License-Identifier: MIT OR Apache-2.0
//! Environment-driven configuration for the Backforge orchestrator (§6).
//!
//! Loading is split in two, mirroring the teacher's CLI config layer:
//! [`BackforgeConfig::from_env`] reads and parses recognized variables,
//! returning a [`ConfigError`] for anything missing or malformed, while
//! [`BackforgeConfig::warnings`] surfaces non-fatal [`ConfigWarning`]s
//! about values that parse but are probably wrong.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use std::env;
use std::fmt;

/// Fully resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct BackforgeConfig {
    /// `PLATFORM_DATABASE_URL`, required.
    pub database_url: String,
    /// `GOOGLE_API_KEY` (or equivalent), required for embeddings and the
    /// default LLM provider.
    pub llm_api_key: String,
    /// `CORS_ORIGINS`, comma-separated, defaults to empty.
    pub cors_origins: Vec<String>,
    /// `PLATFORM_SECRET_KEY`, required when `auth.enabled` on a Spec.
    pub secret_key: String,
    /// `PLATFORM_TOKEN_EXPIRY`, in minutes, defaults to 60.
    pub token_expiry_minutes: u32,
    /// `BACKFORGE_MAX_REPAIR_ATTEMPTS`, bounds the C7 repair loop (§4.7).
    pub max_repair_attempts: u32,
    /// `BACKFORGE_SANDBOX_PORT_RANGE_START` / `_END`, inclusive bounds for
    /// the verification host [`PortPool`](bf_sandbox's port pool).
    pub sandbox_port_range: (u16, u16),
}

/// A missing or malformed environment variable (§6: exit code 2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable was not set.
    Missing {
        /// The variable name.
        var: &'static str,
    },
    /// A variable was set but failed to parse.
    Invalid {
        /// The variable name.
        var: &'static str,
        /// Why it failed to parse.
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing { var } => write!(f, "missing required environment variable: {var}"),
            ConfigError::Invalid { var, reason } => {
                write!(f, "invalid value for {var}: {reason}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Non-fatal configuration concern, surfaced alongside a parsed config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    /// The variable or field this warning concerns.
    pub field: String,
    /// Human-readable description.
    pub message: String,
}

fn env_var(var: &'static str) -> Result<Option<String>, ConfigError> {
    match env::var(var) {
        Ok(v) => Ok(Some(v)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => Err(ConfigError::Invalid {
            var,
            reason: "value is not valid UTF-8".into(),
        }),
    }
}

fn required(var: &'static str) -> Result<String, ConfigError> {
    env_var(var)?.ok_or(ConfigError::Missing { var })
}

impl BackforgeConfig {
    /// Load configuration from the process environment, per §6.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = required("PLATFORM_DATABASE_URL")?;
        let llm_api_key = required("GOOGLE_API_KEY")?;
        let secret_key = env_var("PLATFORM_SECRET_KEY")?.unwrap_or_default();
        let cors_origins = env_var("CORS_ORIGINS")?
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let token_expiry_minutes = match env_var("PLATFORM_TOKEN_EXPIRY")? {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                var: "PLATFORM_TOKEN_EXPIRY",
                reason: format!("'{raw}' is not a valid u32"),
            })?,
            None => 60,
        };

        let max_repair_attempts = match env_var("BACKFORGE_MAX_REPAIR_ATTEMPTS")? {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                var: "BACKFORGE_MAX_REPAIR_ATTEMPTS",
                reason: format!("'{raw}' is not a valid u32"),
            })?,
            None => 3,
        };

        let port_start = match env_var("BACKFORGE_SANDBOX_PORT_RANGE_START")? {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                var: "BACKFORGE_SANDBOX_PORT_RANGE_START",
                reason: format!("'{raw}' is not a valid u16"),
            })?,
            None => 20_000,
        };
        let port_end = match env_var("BACKFORGE_SANDBOX_PORT_RANGE_END")? {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                var: "BACKFORGE_SANDBOX_PORT_RANGE_END",
                reason: format!("'{raw}' is not a valid u16"),
            })?,
            None => 20_999,
        };
        if port_end <= port_start {
            return Err(ConfigError::Invalid {
                var: "BACKFORGE_SANDBOX_PORT_RANGE_END",
                reason: "must be greater than the range start".into(),
            });
        }

        Ok(Self {
            database_url,
            llm_api_key,
            cors_origins,
            secret_key,
            token_expiry_minutes,
            max_repair_attempts,
            sandbox_port_range: (port_start, port_end),
        })
    }

    /// Non-fatal concerns about an otherwise-valid configuration.
    pub fn warnings(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        if self.secret_key.is_empty() {
            warnings.push(ConfigWarning {
                field: "PLATFORM_SECRET_KEY".into(),
                message: "no secret key set; auth-enabled specs will fail at render time".into(),
            });
        }
        if self.cors_origins.is_empty() {
            warnings.push(ConfigWarning {
                field: "CORS_ORIGINS".into(),
                message: "no CORS origins configured".into(),
            });
        }
        if self.max_repair_attempts == 0 {
            warnings.push(ConfigWarning {
                field: "BACKFORGE_MAX_REPAIR_ATTEMPTS".into(),
                message: "repair loop disabled; sandbox failures will never self-heal".into(),
            });
        }
        warnings
    }
}
