//! Client configuration.

use bon::Builder;
use std::time::Duration;

/// Configuration for [`crate::ApiClient`].
#[derive(Debug, Clone, Builder)]
pub struct ClientConfig {
    /// API root, e.g. `http://localhost:8000` or `https://host/api`
    #[builder(into)]
    pub base_url: String,

    /// Per-request timeout (ignored on wasm targets)
    #[builder(default = Duration::from_secs(30))]
    pub timeout: Duration,

    /// Path of the credential-exchange endpoint
    #[builder(into, default = "/token".to_string())]
    pub credential_path: String,

    /// Notification text when the server gives no usable detail
    #[builder(into, default = "Something went wrong".to_string())]
    pub fallback_message: String,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::builder().base_url(base_url).build()
    }
}
