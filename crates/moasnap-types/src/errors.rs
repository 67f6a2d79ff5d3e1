use thiserror::Error;

pub type Result<T, E = SnapError> = std::result::Result<T, E>;

/// Unified error type covering common failure scenarios across subsystems.
#[derive(Debug, Error)]
pub enum SnapError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("camera device unavailable: {0}")]
    DeviceUnavailable(String),
    #[error("empty frame: {0}")]
    EmptyFrame(String),
    #[error("encoding error: {0}")]
    Encoding(String),
    #[error("validation error: {0}")]
    Validation(ValidationError),
    #[error("network error: {0}")]
    Network(String),
    #[error("reconciliation error: {0}")]
    Reconciliation(String),
    #[error("operational error: {0}")]
    Ops(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Precondition failures caught before any I/O happens.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("meeting id is not available")]
    NoMeeting,
    #[error("an upload is already in flight")]
    SubmitInFlight,
}
