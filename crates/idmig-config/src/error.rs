//! Errors raised while loading or checking an [`IdmigConfig`](crate::IdmigConfig).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// A layer (defaults, config.toml files, `.env`, `IDMIG_*` or legacy
    /// variables) could not be read or merged.
    #[error("cannot read idmig config layers: {0}")]
    Figment(#[from] figment::Error),

    /// Credentials for a directory are missing.
    #[error("no credentials for the {section} directory")]
    NotConfigured { section: String },

    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}
