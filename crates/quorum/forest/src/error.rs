use quorum_types::RegistryError;
use thiserror::Error;

/// Errors from forest and correlation-model construction.
#[derive(Error, Debug)]
pub enum ForestError {
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("forest requires at least one decision unit")]
    ZeroUnitCount,

    #[error("correlation matrix requires at least one principle")]
    EmptyCorrelationModel,
}
