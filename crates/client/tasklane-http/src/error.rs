//! Error taxonomy for API calls.

use crate::token::TokenStoreError;
use reqwest::StatusCode;
use thiserror::Error;

/// Errors returned by [`crate::ApiClient`].
#[derive(Error, Debug)]
pub enum ApiError {
    /// Network failure, no response received
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// 401 from the server
    #[error("Unauthorized{}", fmt_detail(.detail))]
    Unauthorized { detail: Option<String> },

    /// 403 from the server
    #[error("Forbidden{}", fmt_detail(.detail))]
    Forbidden { detail: Option<String> },

    /// 404, typically a task removed by another session
    #[error("Not found{}", fmt_detail(.detail))]
    NotFound { detail: Option<String> },

    /// Any other 4xx, usually carrying field-level detail
    #[error("Request rejected ({status}){}", fmt_detail(.detail))]
    Validation {
        status: u16,
        detail: Option<String>,
    },

    /// 5xx or an unexpected status
    #[error("Server error ({status}){}", fmt_detail(.detail))]
    Server {
        status: u16,
        detail: Option<String>,
    },

    /// Successful response whose body did not match the expected shape
    #[error("Invalid response body: {0}")]
    Decode(String),

    /// Request body could not be serialized
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The token slot could not be read or written
    #[error("Token storage error: {0}")]
    Token(#[from] TokenStoreError),
}

fn fmt_detail(detail: &Option<String>) -> String {
    detail
        .as_deref()
        .map(|d| format!(": {d}"))
        .unwrap_or_default()
}

impl ApiError {
    /// Classify a non-success HTTP status.
    pub fn from_status(status: StatusCode, detail: Option<String>) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => Self::Unauthorized { detail },
            StatusCode::FORBIDDEN => Self::Forbidden { detail },
            StatusCode::NOT_FOUND => Self::NotFound { detail },
            s if s.is_client_error() => Self::Validation {
                status: s.as_u16(),
                detail,
            },
            s => Self::Server {
                status: s.as_u16(),
                detail,
            },
        }
    }

    /// HTTP status of the failing response, if one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } => Some(401),
            Self::Forbidden { .. } => Some(403),
            Self::NotFound { .. } => Some(404),
            Self::Validation { status, .. } | Self::Server { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Server-provided `detail` text, if any.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Unauthorized { detail }
            | Self::Forbidden { detail }
            | Self::NotFound { detail }
            | Self::Validation { detail, .. }
            | Self::Server { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// Message suitable for a user-facing notification.
    pub fn user_message(&self, fallback: &str) -> String {
        self.detail().unwrap_or(fallback).to_string()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
