//! Whole-document store combining the remote endpoint with the local cache.
//!
//! Reads prefer the remote copy and refresh the cache with it. When the remote
//! cannot be reached (or returns something that does not decode) the cached
//! copy is used, and failing that the caller's default. Plain reads never
//! fail. An update whose read found neither copy fails instead of saving
//! the default over the document.
//!
//! Writes serialize the full document, store it locally, then POST it. The
//! last write wins; nothing is merged.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::cache::LocalCache;
use crate::error::StoreError;
use crate::remote::RemoteStore;

/// Document keys for the board's data domains.
pub mod keys {
    pub const EVENTS: &str = "events";
    pub const SETTINGS: &str = "settings";
    pub const CHAT: &str = "chat";
    pub const CHAT_USERS: &str = "chat_users";
}

/// In-process key-value backend.
///
/// Behaves like the remote endpoint without the network; used for tests and
/// for running the board without a remote.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    docs: Mutex<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.docs.lock().get(key).cloned()
    }

    pub fn put(&self, key: &str, value: &str) {
        self.docs.lock().insert(key.to_string(), value.to_string());
    }
}

/// Where documents are persisted.
#[derive(Clone)]
pub enum Backend {
    /// Public key-value endpoint over HTTP.
    Remote(Arc<RemoteStore>),

    /// In-process map.
    Memory(Arc<MemoryBackend>),
}

impl Backend {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError> {
        match self {
            Self::Remote(remote) => remote.get_raw(key).await,
            Self::Memory(memory) => Ok(memory.get(key)),
        }
    }

    async fn put_raw(&self, key: &str, body: &str) -> Result<(), StoreError> {
        match self {
            Self::Remote(remote) => remote.put_raw(key, body).await,
            Self::Memory(memory) => {
                memory.put(key, body);
                Ok(())
            }
        }
    }

    /// Prefix for local cache keys, so several boards can share one cache file.
    pub fn namespace(&self) -> &str {
        match self {
            Self::Remote(remote) => remote.bucket(),
            Self::Memory(_) => "memory",
        }
    }
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Remote(remote) => f.debug_tuple("Backend::Remote").field(remote).finish(),
            Self::Memory(_) => f.debug_tuple("Backend::Memory").finish(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct BlobStore {
    backend: Backend,
    cache: Option<Arc<Mutex<LocalCache>>>,
}

impl BlobStore {
    pub fn new(backend: Backend) -> Self {
        Self {
            backend,
            cache: None,
        }
    }

    pub fn remote(remote: RemoteStore) -> Self {
        Self::new(Backend::Remote(Arc::new(remote)))
    }

    pub fn memory() -> Self {
        Self::new(Backend::Memory(Arc::new(MemoryBackend::new())))
    }

    /// Attach a local cache used as the offline fallback.
    pub fn with_cache(mut self, cache: LocalCache) -> Self {
        self.cache = Some(Arc::new(Mutex::new(cache)));
        self
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    fn cache_key(&self, key: &str) -> String {
        format!("{}_{}", self.backend.namespace(), key)
    }

    /// Fetch and decode the remote document, refreshing the local cache.
    ///
    /// # Errors
    /// Network/status failures of the backend, or `StoreError::Decode` when the
    /// stored text is not a valid `T`.
    pub async fn fetch<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let Some(text) = self.backend.get_raw(key).await? else {
            return Ok(None);
        };

        let value = serde_json::from_str::<T>(&text).map_err(|source| StoreError::Decode {
            key: key.to_string(),
            source,
        })?;
        self.cache_put(key, text).await;
        Ok(Some(value))
    }

    /// Remote document, or the cached copy when the remote read fails.
    ///
    /// `Ok(None)` means the remote reported the document absent.
    ///
    /// # Errors
    /// The remote failure, when there is no usable cached copy.
    pub async fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        match self.fetch(key).await {
            Ok(found) => Ok(found),
            Err(e) => match self.cached(key).await {
                Some(value) => {
                    tracing::warn!("Falling back to local copy of {}: {}", key, e);
                    Ok(Some(value))
                }
                None => Err(e),
            },
        }
    }

    /// Read the document under `key`, falling back to the cached copy and then
    /// to `default`.
    pub async fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        match self.load(key).await {
            Ok(Some(value)) => value,
            Ok(None) => default,
            Err(e) => {
                tracing::warn!("No copy of {} available, using default: {}", key, e);
                default
            }
        }
    }

    /// Replace the document under `key` with `value`.
    ///
    /// The local cache is written first, so a failed upload still leaves the
    /// new value readable offline.
    ///
    /// # Errors
    /// `StoreError::Encode` if `value` cannot be serialized, or the backend
    /// error if the upload fails.
    pub async fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let body = serde_json::to_string(value).map_err(|source| StoreError::Encode {
            key: key.to_string(),
            source,
        })?;

        self.cache_put(key, body.clone()).await;

        if let Err(e) = self.backend.put_raw(key, &body).await {
            tracing::error!("Failed to save {} to remote store: {}", key, e);
            return Err(e);
        }

        tracing::debug!("Saved {} ({} bytes)", key, body.len());
        Ok(())
    }

    /// Decoded local copy of `key`, if any.
    pub async fn cached<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let text = self.cache_get(key).await?;
        match serde_json::from_str(&text) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Discarding unreadable local copy of {}: {}", key, e);
                None
            }
        }
    }

    async fn cache_get(&self, key: &str) -> Option<String> {
        let cache = self.cache.clone()?;
        let cache_key = self.cache_key(key);
        let result = tokio::task::spawn_blocking(move || cache.lock().get(&cache_key)).await;

        match result {
            Ok(Ok(value)) => value,
            Ok(Err(e)) => {
                tracing::warn!("Local cache read failed for {}: {}", key, e);
                None
            }
            Err(e) => {
                tracing::warn!("Local cache task failed for {}: {}", key, e);
                None
            }
        }
    }

    async fn cache_put(&self, key: &str, text: String) {
        let Some(cache) = self.cache.clone() else {
            return;
        };
        let cache_key = self.cache_key(key);
        let result =
            tokio::task::spawn_blocking(move || cache.lock().put(&cache_key, &text)).await;

        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!("Local cache write failed for {}: {}", key, e),
            Err(e) => tracing::warn!("Local cache task failed for {}: {}", key, e),
        }
    }
}

/// Typed handle on one document: `get()` and `save()`.
pub struct Collection<T> {
    store: BlobStore,
    key: &'static str,
    default: fn() -> T,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            key: self.key,
            default: self.default,
        }
    }
}

impl<T> std::fmt::Debug for Collection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection").field("key", &self.key).finish()
    }
}

impl<T> Collection<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(store: BlobStore, key: &'static str, default: fn() -> T) -> Self {
        Self {
            store,
            key,
            default,
        }
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    pub fn default_value(&self) -> T {
        (self.default)()
    }

    pub async fn get(&self) -> T {
        self.store.get(self.key, (self.default)()).await
    }

    /// Like [`get`](Self::get), but a read that yields neither the remote
    /// document nor a cached copy is an error instead of the default.
    ///
    /// # Errors
    /// See [`BlobStore::load`].
    pub async fn try_get(&self) -> Result<T, StoreError> {
        Ok(self
            .store
            .load(self.key)
            .await?
            .unwrap_or_else(self.default))
    }

    /// # Errors
    /// See [`BlobStore::save`].
    pub async fn save(&self, value: &T) -> Result<(), StoreError> {
        self.store.save(self.key, value).await
    }

    /// Fetch the document, apply `edit`, and save the whole document back.
    ///
    /// Only an absent document starts from the default. When the document
    /// cannot be read and nothing is cached, nothing is saved.
    ///
    /// # Errors
    /// The read failure, whatever `edit` returns, or the save failure.
    pub async fn update<R, E, F>(&self, edit: F) -> Result<R, E>
    where
        F: FnOnce(&mut T) -> Result<R, E>,
        E: From<StoreError>,
    {
        let mut value = self.try_get().await?;
        let out = edit(&mut value)?;
        self.save(&value).await?;
        Ok(out)
    }
}
