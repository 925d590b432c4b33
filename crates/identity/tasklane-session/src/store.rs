//! Session store: the only component that moves the session between states.

use crate::error::{AuthError, RegisterError};
use crate::state::{Session, SessionState};
use crate::validation::{CredentialMode, validate_credentials};
use futures_signals::signal::{Mutable, Signal};
use tasklane_http::{ApiClient, ApiError, ApiRequest, Notification};
use tasklane_types::{TokenResponse, User};
use tracing::{debug, info, warn};

const CURRENT_USER_PATH: &str = "/users/me";
const USERS_PATH: &str = "/users";

/// Detail-text fallback for servers that report a name conflict without 409.
fn is_username_conflict(detail: &str) -> bool {
    let detail = detail.to_lowercase();
    detail.contains("username") && (detail.contains("taken") || detail.contains("exists"))
}

fn classify_register_error(error: ApiError) -> RegisterError {
    match error {
        ApiError::Validation {
            status: 409,
            detail,
        } => RegisterError::UsernameTaken(
            detail.unwrap_or_else(|| "Username already exists".to_string()),
        ),
        ApiError::Validation {
            detail: Some(detail),
            ..
        } if is_username_conflict(&detail) => RegisterError::UsernameTaken(detail),
        ApiError::Validation { status, detail } => RegisterError::Invalid(
            detail.unwrap_or_else(|| format!("server rejected the request ({status})")),
        ),
        other => RegisterError::Api(other),
    }
}

pub struct SessionStore {
    api: ApiClient,
    state: Mutable<SessionState>,
}

impl SessionStore {
    /// Create the store in `Unresolved` and subscribe to forced expiry.
    pub fn new(api: ApiClient) -> Self {
        let state = Mutable::new(SessionState::Unresolved);

        let expired = state.clone();
        api.tokens().on_expired(move || {
            info!("Session expired, switching to anonymous");
            expired.set(SessionState::Anonymous);
        });

        Self { api, state }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn state(&self) -> SessionState {
        self.state.get_cloned()
    }

    pub fn session(&self) -> Session {
        self.state.lock_ref().session()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.lock_ref().is_authenticated()
    }

    pub fn current_user(&self) -> Option<User> {
        self.state.lock_ref().user().cloned()
    }

    /// Stream of state changes for reactive views.
    pub fn signal(&self) -> impl Signal<Item = SessionState> + use<> {
        self.state.signal_cloned()
    }

    fn transition(&self, next: SessionState) -> SessionState {
        debug!(from = ?*self.state.lock_ref(), to = ?next, "Session transition");
        self.state.set(next.clone());
        next
    }

    async fn fetch_current_user(&self) -> Result<User, ApiError> {
        self.api.request(ApiRequest::get(CURRENT_USER_PATH)).await
    }

    /// Resolve the persisted token, if any, into a session.
    pub async fn initialize(&self) -> SessionState {
        let snapshot = match self.api.tokens().snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Could not read persisted token: {}", e);
                return self.transition(SessionState::Anonymous);
            }
        };

        if snapshot.token.is_none() {
            debug!("No persisted token");
            return self.transition(SessionState::Anonymous);
        }

        self.transition(SessionState::Resolving);

        match self.fetch_current_user().await {
            Ok(user) => {
                info!("Restored session for {}", user.username);
                self.transition(SessionState::Authenticated(user))
            }
            Err(e) => {
                warn!("Persisted token was rejected: {}", e);
                if let Err(e) = self.api.tokens().revoke(snapshot.epoch).await {
                    warn!("Failed to erase rejected token: {}", e);
                }
                self.transition(SessionState::Anonymous)
            }
        }
    }

    /// Exchange credentials for a token, then load the profile.
    ///
    /// The profile fetch starts only after the token is stored. If it fails
    /// the token is erased again.
    pub async fn login(&self, username: &str, password: &str) -> Result<User, AuthError> {
        validate_credentials(CredentialMode::Login, username, password)?;

        let tokens = self.api.tokens();
        let started = tokens.epoch();

        let request = ApiRequest::post(self.api.config().credential_path.clone())
            .form([("username", username), ("password", password)])
            .credential_exchange();

        let response: TokenResponse = match self.api.request(request).await {
            Ok(response) => response,
            Err(ApiError::Unauthorized { .. }) => {
                info!("Login rejected for {}", username);
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => {
                warn!("Token exchange failed: {}", e);
                return Err(AuthError::Exchange(e));
            }
        };

        let Some(installed) = tokens.install(&response.access_token, started).await? else {
            return Err(AuthError::Superseded);
        };

        match self.fetch_current_user().await {
            Ok(user) => {
                info!("Logged in as {}", user.username);
                self.transition(SessionState::Authenticated(user.clone()));
                self.api
                    .notifier()
                    .notify(Notification::success("Logged in successfully"));
                Ok(user)
            }
            Err(e) => {
                warn!("Profile fetch after login failed: {}", e);
                if let Err(e) = tokens.revoke(installed).await {
                    warn!("Failed to erase token after failed login: {}", e);
                }
                self.transition(SessionState::Anonymous);
                Err(e.into())
            }
        }
    }

    /// Create an account. Does not sign in.
    pub async fn register(&self, username: &str, password: &str) -> Result<User, RegisterError> {
        validate_credentials(CredentialMode::Register, username, password)?;

        let request = ApiRequest::post(USERS_PATH).json(&serde_json::json!({
            "username": username,
            "password": password,
        }))?;

        match self.api.request::<User>(request).await {
            Ok(user) => {
                info!("Registered user {}", user.username);
                self.api.notifier().notify(Notification::success(
                    "Registration successful, you can now log in",
                ));
                Ok(user)
            }
            Err(e) => Err(classify_register_error(e)),
        }
    }

    /// Erase the token and drop to anonymous. Never fails.
    pub async fn logout(&self) {
        if let Err(e) = self.api.tokens().clear().await {
            warn!("Failed to erase token on logout: {}", e);
        }
        info!("Logged out");
        self.transition(SessionState::Anonymous);
    }
}
