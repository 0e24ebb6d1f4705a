use quorum_forest::ForestError;
use quorum_types::{ConfigError, RegistryError};
use thiserror::Error;

/// Errors surfaced to `govern` callers.
#[derive(Error, Debug)]
pub enum GovernError {
    /// Fatal at construction; the engine instance must not be used.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Recoverable; retry after the hinted delay.
    #[error("rate limit exceeded, retry after {retry_after_ms} ms")]
    RateLimitExceeded { retry_after_ms: u64 },

    /// Recoverable; retry with backoff.
    #[error("governance call exceeded {timeout_secs} s")]
    Timeout { timeout_secs: u64 },
}

impl From<ConfigError> for GovernError {
    fn from(err: ConfigError) -> Self {
        GovernError::InvalidConfiguration(err.to_string())
    }
}

impl From<ForestError> for GovernError {
    fn from(err: ForestError) -> Self {
        GovernError::InvalidConfiguration(err.to_string())
    }
}

impl From<RegistryError> for GovernError {
    fn from(err: RegistryError) -> Self {
        GovernError::InvalidConfiguration(err.to_string())
    }
}

/// Failure inside a single domain callback.
///
/// Never propagates as a call failure; recorded as an error entry in the
/// verdict's domain diagnostics instead.
#[derive(Error, Debug)]
pub enum CallbackError {
    #[error("callback timed out after {0} ms")]
    Timeout(u64),

    #[error("{0}")]
    Failed(String),
}
