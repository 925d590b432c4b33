use std::path::PathBuf;
use tasklane_http::ApiError;
use tasklane_session::{AuthError, RegisterError};
use tasklane_sync::{FlowError, SyncError};
use tasklane_types::{PriorityError, TaskId};
use thiserror::Error;

/// Errors surfaced by the `tasklane` binary
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Could not determine the user configuration directory")]
    NoConfigDir,

    #[error("Failed to read config file at {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to serialize config: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("Failed to write config file at {path}: {source}")]
    ConfigWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Not logged in. Run `tasklane login` first")]
    NotLoggedIn,

    #[error("Task {0} not found")]
    TaskNotFound(TaskId),

    #[error("{0}")]
    Priority(#[from] PriorityError),

    #[error("Prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Register(#[from] RegisterError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Flow(#[from] FlowError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl CliError {
    /// True when the API client already showed this failure to the user.
    ///
    /// Token exchange failures are never notified by the client.
    pub fn already_reported(&self) -> bool {
        match self {
            Self::Api(_)
            | Self::Auth(AuthError::Api(_))
            | Self::Register(RegisterError::Api(_))
            | Self::Sync(SyncError::Api(_))
            | Self::Flow(FlowError::Sync(SyncError::Api(_))) => true,
            _ => false,
        }
    }
}

pub type CliResult<T> = std::result::Result<T, CliError>;
