use tasklane_http::ApiError;
use tasklane_types::DraftError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Invalid task: {0}")]
    Invalid(#[from] DraftError),

    /// A newer read or an invalidation was issued while this read was in flight
    #[error("Read superseded by a newer request")]
    Superseded,
}

pub type SyncResult<T> = std::result::Result<T, SyncError>;

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("Another dialog is already open")]
    NotIdle,

    #[error("No dialog is open for this action")]
    WrongState,

    #[error("A submission is already in progress")]
    AlreadySubmitting,

    #[error("Invalid task: {0}")]
    Invalid(#[from] DraftError),

    #[error(transparent)]
    Sync(#[from] SyncError),
}
