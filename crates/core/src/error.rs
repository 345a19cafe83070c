use crate::lookup::LookupState;
use thiserror::Error;

/// Contract violations raised by the lookup engine.
///
/// These are programming errors on the caller's side; failures of the
/// discovery collaborators never surface through this type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("At least one server identity is required")]
    EmptyIdentities,

    #[error("A result scope is required")]
    MissingScope,

    #[error("A discovery port is required")]
    MissingDiscovery,

    #[error("Invalid lookup options: {reason}")]
    InvalidOptions { reason: String },

    #[error("Worker pool could not be started: {reason}")]
    PoolUnavailable { reason: String },

    #[error("Lookup cannot be started from state {state}")]
    AlreadyStarted { state: LookupState },
}

pub type Result<T> = std::result::Result<T, LookupError>;
