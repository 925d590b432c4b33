//! Authentication session for the tasklane client.
//!
//! [`SessionStore`] derives the session from the persisted token at startup
//! and owns the login, registration and logout flows. Credentials are
//! pre-checked locally with [`validate_credentials`] before any request.

mod error;
mod state;
mod store;
mod validation;

pub use error::{AuthError, RegisterError};
pub use state::{Session, SessionState};
pub use store::SessionStore;
pub use validation::{
    CredentialMode, Field, FieldError, Rule, ValidationErrors, validate_credentials,
};
