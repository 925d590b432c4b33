//! Persisted bearer token slot.
//!
//! [`TokenStore`] is the durable backend. [`TokenVault`] wraps it and is the
//! only writer: every write bumps an epoch, and writers that started under an
//! older epoch are refused.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum TokenStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed token file: {0}")]
    Json(#[from] serde_json::Error),
}

pub type TokenStoreResult<T> = Result<T, TokenStoreError>;

/// Durable storage holding at most one token.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn load(&self) -> TokenStoreResult<Option<String>>;

    async fn save(&self, token: &str) -> TokenStoreResult<()>;

    async fn clear(&self) -> TokenStoreResult<()>;
}

/// Process-local token storage.
#[derive(Default)]
pub struct InMemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn load(&self) -> TokenStoreResult<Option<String>> {
        Ok(self.token.read().await.clone())
    }

    async fn save(&self, token: &str) -> TokenStoreResult<()> {
        *self.token.write().await = Some(token.to_string());
        Ok(())
    }

    async fn clear(&self) -> TokenStoreResult<()> {
        *self.token.write().await = None;
        Ok(())
    }
}

#[derive(Serialize, Deserialize)]
struct StoredToken {
    access_token: String,
}

/// Token kept in a JSON file; a missing file means no token.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self) -> TokenStoreResult<Option<String>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let stored: StoredToken = serde_json::from_str(&contents)?;
        Ok(Some(stored.access_token))
    }

    async fn save(&self, token: &str) -> TokenStoreResult<()> {
        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        let contents = serde_json::to_string_pretty(&StoredToken {
            access_token: token.to_string(),
        })?;
        tokio::fs::write(&self.path, contents).await?;
        Ok(())
    }

    async fn clear(&self) -> TokenStoreResult<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Token value together with the epoch it was read under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSnapshot {
    pub token: Option<String>,
    pub epoch: u64,
}

type ExpiryListener = Arc<dyn Fn() + Send + Sync>;

/// Single writer for the token slot.
pub struct TokenVault {
    store: Box<dyn TokenStore>,
    epoch: AtomicU64,
    write_lock: tokio::sync::Mutex<()>,
    listeners: Mutex<Vec<ExpiryListener>>,
}

impl TokenVault {
    pub fn new(store: impl TokenStore + 'static) -> Self {
        Self {
            store: Box::new(store),
            epoch: AtomicU64::new(0),
            write_lock: tokio::sync::Mutex::new(()),
            listeners: Mutex::new(Vec::new()),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(InMemoryTokenStore::new())
    }

    /// Current write generation.
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Register a callback run after a forced expiry erased the token.
    pub fn on_expired(&self, listener: impl Fn() + Send + Sync + 'static) {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(listener));
    }

    pub async fn snapshot(&self) -> TokenStoreResult<TokenSnapshot> {
        let _guard = self.write_lock.lock().await;
        let token = self.store.load().await?;
        Ok(TokenSnapshot {
            token,
            epoch: self.epoch(),
        })
    }

    /// Persist `token` unless the slot was written since `expected_epoch`.
    ///
    /// Returns the epoch the token was stored under, or `None` when the
    /// write was refused.
    pub async fn install(
        &self,
        token: &str,
        expected_epoch: u64,
    ) -> TokenStoreResult<Option<u64>> {
        let _guard = self.write_lock.lock().await;
        if self.epoch() != expected_epoch {
            warn!(
                expected_epoch,
                current_epoch = self.epoch(),
                "Refusing to store token obtained under a superseded session"
            );
            return Ok(None);
        }
        self.store.save(token).await?;
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(epoch, "Stored new token");
        Ok(Some(epoch))
    }

    /// Erase the token unconditionally (logout).
    ///
    /// The epoch only moves once the store has actually dropped the token.
    pub async fn clear(&self) -> TokenStoreResult<()> {
        let _guard = self.write_lock.lock().await;
        self.store.clear().await?;
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(epoch, "Cleared token");
        Ok(())
    }

    /// Erase the token only if nothing was written since `seen_epoch`.
    ///
    /// Returns `false` without touching the slot when the token was replaced
    /// in the meantime.
    pub async fn revoke(&self, seen_epoch: u64) -> TokenStoreResult<bool> {
        let _guard = self.write_lock.lock().await;
        if self.epoch() != seen_epoch {
            debug!(
                seen_epoch,
                current_epoch = self.epoch(),
                "Token changed since it was used, leaving it in place"
            );
            return Ok(false);
        }
        self.store.clear().await?;
        self.epoch.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }

    /// Forced expiry: [`Self::revoke`] after the server rejected a request
    /// sent under `seen_epoch`, then run expiry listeners.
    pub async fn expire(&self, seen_epoch: u64) -> TokenStoreResult<bool> {
        if !self.revoke(seen_epoch).await? {
            return Ok(false);
        }
        info!("Session expired, token erased");

        // Listeners may register further listeners.
        let listeners = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for listener in &listeners {
            listener();
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    /// Holds a token it cannot erase.
    struct StuckStore {
        inner: InMemoryTokenStore,
    }

    #[async_trait]
    impl TokenStore for StuckStore {
        async fn load(&self) -> TokenStoreResult<Option<String>> {
            self.inner.load().await
        }

        async fn save(&self, token: &str) -> TokenStoreResult<()> {
            self.inner.save(token).await
        }

        async fn clear(&self) -> TokenStoreResult<()> {
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only").into())
        }
    }

    #[tokio::test]
    async fn test_install_bumps_epoch() {
        let vault = TokenVault::in_memory();
        assert_eq!(vault.install("abc", 0).await.unwrap(), Some(1));

        let snapshot = vault.snapshot().await.unwrap();
        assert_eq!(snapshot.token.as_deref(), Some("abc"));
        assert_eq!(snapshot.epoch, 1);
    }

    #[tokio::test]
    async fn test_install_refused_after_clear() {
        let vault = TokenVault::in_memory();
        let started = vault.epoch();

        vault.clear().await.unwrap();

        assert_eq!(vault.install("late", started).await.unwrap(), None);
        assert_eq!(vault.snapshot().await.unwrap().token, None);
    }

    #[tokio::test]
    async fn test_expire_runs_listeners_once() {
        let vault = TokenVault::new(InMemoryTokenStore::with_token("abc"));
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        vault.on_expired(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let seen = vault.epoch();
        assert!(vault.expire(seen).await.unwrap());
        // A second 401 from the same generation is already stale.
        assert!(!vault.expire(seen).await.unwrap());

        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(vault.snapshot().await.unwrap().token, None);
    }

    #[tokio::test]
    async fn test_expire_ignores_replaced_token() {
        let vault = TokenVault::new(InMemoryTokenStore::with_token("old"));
        let seen = vault.epoch();
        assert!(vault.install("new", seen).await.unwrap().is_some());

        assert!(!vault.expire(seen).await.unwrap());
        assert_eq!(vault.snapshot().await.unwrap().token.as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn test_failed_clear_keeps_epoch() {
        let vault = TokenVault::new(StuckStore {
            inner: InMemoryTokenStore::with_token("abc"),
        });
        let seen = vault.epoch();

        assert!(matches!(vault.clear().await, Err(TokenStoreError::Io(_))));
        assert_eq!(vault.epoch(), seen);

        // The token is still there, so a 401 under the same epoch must still reach it.
        assert!(vault.expire(seen).await.is_err());
        assert_eq!(vault.epoch(), seen);
        assert_eq!(vault.snapshot().await.unwrap().token.as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn test_listener_may_register_listeners() {
        let vault = Arc::new(TokenVault::new(InMemoryTokenStore::with_token("abc")));
        let fired = Arc::new(AtomicUsize::new(0));

        let weak = Arc::downgrade(&vault);
        let counter = fired.clone();
        vault.on_expired(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            if let Some(vault) = weak.upgrade() {
                let counter = counter.clone();
                vault.on_expired(move || {
                    counter.fetch_add(10, Ordering::SeqCst);
                });
            }
        });

        let seen = vault.epoch();
        assert!(vault.expire(seen).await.unwrap());
        // Only listeners present when the expiry started ran.
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        vault.install("again", vault.epoch()).await.unwrap();
        assert!(vault.expire(vault.epoch()).await.unwrap());
        assert_eq!(fired.load(Ordering::SeqCst), 1 + 1 + 10);
    }

    #[tokio::test]
    async fn test_file_store_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("nested").join("token.json"));

        assert_eq!(store.load().await.unwrap(), None);

        store.save("abc").await.unwrap();
        assert_eq!(store.load().await.unwrap().as_deref(), Some("abc"));

        store.clear().await.unwrap();
        assert_eq!(store.load().await.unwrap(), None);
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_file_store_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        tokio::fs::write(&path, "not json").await.unwrap();

        let store = FileTokenStore::new(path);
        assert!(matches!(store.load().await, Err(TokenStoreError::Json(_))));
    }
}
