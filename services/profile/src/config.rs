//! Service configuration

use anyhow::Result;
use ::config::{Config, Environment};
use serde::Deserialize;

use crate::validation::PasswordPolicy;

/// Profile service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Address the HTTP server binds to
    pub bind_address: String,
    /// Default log filter when `RUST_LOG` is unset
    pub log_level: String,
    /// PEM public key (RS256) or shared secret (HS256) used to verify bearer tokens
    pub jwt_key: String,
    /// Minimum length of a new password
    pub password_min_length: usize,
    /// Also require mixed case, a digit and a symbol
    pub password_strict: bool,
}

impl ServiceConfig {
    /// Load configuration from defaults overlaid with environment variables
    ///
    /// # Environment Variables
    /// - `PROFILE_BIND_ADDRESS` (default: "0.0.0.0:3002")
    /// - `PROFILE_LOG_LEVEL` (default: "info")
    /// - `PROFILE_JWT_KEY` (required)
    /// - `PROFILE_PASSWORD_MIN_LENGTH` (default: 8)
    /// - `PROFILE_PASSWORD_STRICT` (default: false)
    pub fn from_env() -> Result<Self> {
        let settings = Config::builder()
            .set_default("bind_address", "0.0.0.0:3002")?
            .set_default("log_level", "info")?
            .set_default("password_min_length", 8_i64)?
            .set_default("password_strict", false)?
            .add_source(Environment::with_prefix("PROFILE").try_parsing(true))
            .build()?;

        let config = settings
            .try_deserialize::<ServiceConfig>()
            .map_err(|e| anyhow::anyhow!("Invalid profile service configuration: {}", e))?;

        Ok(config)
    }

    /// Password policy applied to new passwords
    pub fn password_policy(&self) -> PasswordPolicy {
        if self.password_strict {
            PasswordPolicy::strict(self.password_min_length)
        } else {
            PasswordPolicy {
                min_length: self.password_min_length,
                ..PasswordPolicy::default()
            }
        }
    }
}
