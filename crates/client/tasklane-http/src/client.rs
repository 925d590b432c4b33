//! Request dispatch, bearer injection and failure handling.

use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult};
use crate::navigate::{Navigator, Route};
use crate::notify::{Notification, Notifier};
use crate::request::{ApiRequest, RequestBody};
use crate::token::TokenVault;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

/// Helper function to join URL segments properly
fn join_url_segments(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        base.to_string()
    } else {
        format!("{}/{}", base, path)
    }
}

/// Pull a human-readable message out of an error body.
///
/// Accepts `{"detail": "text"}` and the list form
/// `{"detail": [{"msg": "..."}, ...]}`.
fn detail_from_body(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Array(items) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            (!messages.is_empty()).then(|| messages.join("; "))
        }
        _ => None,
    }
}

/// Shared handle to the REST API. Cheap to clone.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: Arc<ClientConfig>,
    tokens: Arc<TokenVault>,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
}

impl ApiClient {
    pub fn new(
        config: ClientConfig,
        tokens: Arc<TokenVault>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
    ) -> ApiResult<Self> {
        Url::parse(&config.base_url)?;

        let http = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            http,
            config: Arc::new(config),
            tokens,
            notifier,
            navigator,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn tokens(&self) -> &Arc<TokenVault> {
        &self.tokens
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    /// Send `request` and decode the JSON response body.
    pub async fn request<T: DeserializeOwned>(&self, request: ApiRequest) -> ApiResult<T> {
        let response = self.dispatch(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Send `request` and discard the response body.
    pub async fn execute(&self, request: ApiRequest) -> ApiResult<()> {
        self.dispatch(request).await.map(|_| ())
    }

    async fn dispatch(&self, request: ApiRequest) -> ApiResult<reqwest::Response> {
        let credential_exchange =
            request.credential_exchange || request.path == self.config.credential_path;
        let snapshot = self.tokens.snapshot().await?;

        let url = join_url_segments(&self.config.base_url, &request.path);
        debug!(method = %request.method, %url, "Dispatching API request");

        let mut builder = self.http.request(request.method, url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = &snapshot.token {
            builder = builder.bearer_auth(token);
        }
        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(body) => builder.json(&body),
            RequestBody::Form(fields) => builder.form(&fields),
        };

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                let error = ApiError::Transport(e);
                return Err(self.fail(error, credential_exchange, snapshot.epoch).await);
            }
        };

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        // An unreadable error body still leaves the status to classify by.
        let body = response.text().await.unwrap_or_default();
        let error = ApiError::from_status(status, detail_from_body(&body));
        Err(self.fail(error, credential_exchange, snapshot.epoch).await)
    }

    /// Run the failure side effects, then hand the error back for propagation.
    async fn fail(&self, error: ApiError, credential_exchange: bool, epoch: u64) -> ApiError {
        if credential_exchange {
            debug!("Credential exchange failed: {}", error);
            return error;
        }

        warn!("API request failed: {}", error);

        if error.is_unauthorized() {
            match self.tokens.expire(epoch).await {
                Ok(true) => self.navigator.navigate(Route::Login),
                Ok(false) => {}
                Err(e) => warn!("Failed to erase expired token: {}", e),
            }
        }

        self.notifier.notify(Notification::error(
            error.user_message(&self.config.fallback_message),
        ));
        error
    }
}
