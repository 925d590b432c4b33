use crate::validation::ValidationErrors;
use tasklane_http::{ApiError, TokenStoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Invalid username or password")]
    InvalidCredentials,

    /// A logout or forced expiry happened while the login was in flight
    #[error("Login was superseded by a newer session change")]
    Superseded,

    /// The token endpoint failed for a reason other than bad credentials.
    /// The client does not notify for these, so callers must show them.
    #[error("Login failed: {0}")]
    Exchange(ApiError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Token storage error: {0}")]
    Token(#[from] TokenStoreError),
}

#[derive(Debug, Error)]
pub enum RegisterError {
    #[error("Invalid registration: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Username already taken: {0}")]
    UsernameTaken(String),

    /// Server rejected the request for any other reason
    #[error("Registration rejected: {0}")]
    Invalid(String),

    #[error("API error: {0}")]
    Api(#[from] ApiError),
}
