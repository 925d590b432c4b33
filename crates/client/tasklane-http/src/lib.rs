//! HTTP client for the tasklane REST API.
//!
//! Every request goes through [`ApiClient`], which:
//! - attaches the stored bearer token when one exists,
//! - treats a 401 on anything but the credential exchange as session expiry
//!   (erase the token, fire expiry listeners, navigate to login),
//! - reports every failure once through the [`Notifier`] side channel before
//!   returning it to the caller.
//!
//! The token slot itself is owned by [`TokenVault`], the only component
//! allowed to write it.

mod client;
mod config;
mod error;
mod navigate;
mod notify;
mod request;
mod token;

pub use client::ApiClient;
pub use config::ClientConfig;
pub use error::{ApiError, ApiResult};
pub use navigate::{Navigator, NoopNavigator, Route};
pub use notify::{ChannelNotifier, Notification, NotificationLevel, Notifier, TracingNotifier};
pub use request::{ApiRequest, RequestBody};
pub use token::{
    FileTokenStore, InMemoryTokenStore, TokenSnapshot, TokenStore, TokenStoreError, TokenVault,
};

pub use reqwest::Method;
