//! # idmig-config
//!
//! Layered configuration loading for idmig using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`IDMIG_*` prefix, `__` as separator)
//! 2. Legacy variables (`AUTH0_TOKEN`, `AUTH0_TENANT_ID`, `DESCOPE_PROJECT_ID`,
//!    `DESCOPE_MANAGEMENT_KEY`)
//! 3. Project-level `.idmig/config.toml`
//! 4. User-level `~/.config/idmig/config.toml`
//! 5. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `IDMIG_SOURCE__TOKEN` -> `source.token`,
//! `IDMIG_RETRY__MAX_ATTEMPTS` -> `retry.max_attempts`, etc.
//! The `__` (double underscore) separates nested config sections.
//!
//! # Usage
//!
//! ```no_run
//! use idmig_config::IdmigConfig;
//!
//! let config = IdmigConfig::load_with_dotenv().expect("config");
//! config.validate().expect("valid config");
//!
//! if config.source.is_configured() {
//!     println!("Source API: {}", config.source.api_base());
//! }
//! ```

mod error;
mod general;
mod retry;
mod source;
mod target;

pub use error::ConfigError;
pub use general::GeneralConfig;
pub use retry::{ExhaustionPolicy, RetryConfig};
pub use source::SourceConfig;
pub use target::TargetConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Unprefixed variables accepted for compatibility with older `.env` files,
/// and the config key each one fills.
const LEGACY_ENV: [(&str, &str); 4] = [
    ("AUTH0_TOKEN", "source.token"),
    ("AUTH0_TENANT_ID", "source.tenant_id"),
    ("DESCOPE_PROJECT_ID", "target.project_id"),
    ("DESCOPE_MANAGEMENT_KEY", "target.management_key"),
];

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct IdmigConfig {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub target: TargetConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub general: GeneralConfig,
}

impl IdmigConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    ///
    /// Does NOT call `dotenvy` -- use [`IdmigConfig::load_with_dotenv`] if you
    /// need `.env` file loading.
    pub fn load() -> Result<Self, ConfigError> {
        Self::figment().extract().map_err(ConfigError::from)
    }

    /// Load configuration with `.env` file support.
    ///
    /// Loads `.env` from the current directory (if present) before building
    /// the figment. This is the typical entry point for the CLI.
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Build the figment provider chain.
    ///
    /// This is public so tests can inspect the figment directly or add
    /// additional providers on top.
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Layer 1: User-global config
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        // Layer 2: Project-local config
        let local_path = PathBuf::from(".idmig/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        // Layer 3: Legacy unprefixed variables
        figment = figment.merge(Self::legacy_env());

        // Layer 4: Environment variables (highest priority)
        figment = figment.merge(Env::prefixed("IDMIG_").split("__"));

        figment
    }

    /// Reject values the fetcher and engine cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source.page_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "source.page_size".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "retry.max_attempts".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.retry.base_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "retry.base_secs".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.general.password_batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "general.password_batch_size".into(),
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }

    /// Fail unless the source directory has credentials. Enough for a dry
    /// run, which never contacts the target.
    pub fn require_source(&self) -> Result<(), ConfigError> {
        if !self.source.is_configured() {
            return Err(ConfigError::NotConfigured {
                section: "source".into(),
            });
        }
        Ok(())
    }

    /// Fail unless both directories have credentials.
    pub fn require_live(&self) -> Result<(), ConfigError> {
        self.require_source()?;
        if !self.target.is_configured() {
            return Err(ConfigError::NotConfigured {
                section: "target".into(),
            });
        }
        Ok(())
    }

    /// Map the legacy variable names onto their nested keys.
    fn legacy_env() -> Env {
        Env::raw().filter_map(|key| {
            LEGACY_ENV
                .iter()
                .find(|(legacy, _)| key.as_str().eq_ignore_ascii_case(legacy))
                .map(|(_, mapped)| (*mapped).into())
        })
    }

    /// Path to the user-global config file.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("idmig").join("config.toml"))
    }
}
