//! Error types shared by the cache, the calendar loader and the primitives.
//!
//! Two classes matter to callers:
//! - [`CoreError::Contract`]: an invariant violation (alignment, geometry, ordering,
//!   header or metadata mismatch). Data that trips it is corrupt or produced by a bug.
//! - [`CoreError::Input`]: malformed caller input (overrides file, interval list,
//!   `HH:MM` values, unknown tags or timeframes).
//!
//! The remaining variants wrap the underlying I/O and codec failures.

use thiserror::Error;

/// The unified error type for the `market_core` crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An invariant of the stored data or of an admitted bar was violated.
    #[error("contract violation: {0}")]
    Contract(String),

    /// Caller-supplied input is malformed.
    #[error("invalid input: {0}")]
    Input(String),

    /// A generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Tabular file could not be read or written.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON (metadata, overrides, payload) could not be parsed or produced.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML configuration could not be parsed.
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Database engine failure.
    #[error("database error: {0}")]
    Database(String),
}

impl CoreError {
    pub(crate) fn contract(msg: impl Into<String>) -> Self {
        Self::Contract(msg.into())
    }

    pub(crate) fn input(msg: impl Into<String>) -> Self {
        Self::Input(msg.into())
    }

    /// `true` for the contract-violation class.
    pub fn is_contract(&self) -> bool {
        matches!(self, Self::Contract(_))
    }
}

impl From<shared_utils::config::ConfigError> for CoreError {
    fn from(e: shared_utils::config::ConfigError) -> Self {
        Self::Input(e.to_string())
    }
}

/// Result alias used throughout the crate.
pub type CoreResult<T> = Result<T, CoreError>;
