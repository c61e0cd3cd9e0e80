use thiserror::Error;

/// Failure reported by a compression backend.
///
/// Variants carry the underlying library message as a string so that the
/// controller can keep the last error around for display and tests can
/// script failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("failed to decode input: {0}")]
    Decode(String),

    #[error("failed to encode output: {0}")]
    Encode(String),

    #[error("failed to load document: {0}")]
    Load(String),

    #[error("failed to serialize document: {0}")]
    Serialize(String),

    #[error("compression task aborted: {0}")]
    Task(String),
}

pub type BackendResult<T> = Result<T, BackendError>;

impl From<tokio::task::JoinError> for BackendError {
    fn from(err: tokio::task::JoinError) -> Self {
        BackendError::Task(err.to_string())
    }
}
