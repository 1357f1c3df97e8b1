//! Local persistence for the identity record and the last resolved dataset.
//!
//! [`LocalStore`] is a small key/value interface over JSON strings with a
//! file-backed and an in-memory implementation. [`LocalState`] layers the
//! two typed records on top, under a fixed namespace:
//!
//! - `{namespace}User` -- the [`AuthResponse`] of the last login
//! - `{namespace}Projection` -- a [`CachedDataset`] keyed by user

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use carbonscape_types::{AuthResponse, ProjectionDataset, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::StoreError;

/// Key/value store of JSON documents.
pub trait LocalStore: Send + Sync {
    /// Read `key`, or `None` if it was never written.
    fn load(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write `value` under `key`, replacing any previous value.
    fn save(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete `key`. Removing a missing key succeeds.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// One JSON file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Store rooted at `dir`, created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl LocalStore for FileStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        // Write then rename so a crash never leaves a half-written record.
        let staging = self.dir.join(format!("{key}.json.tmp"));
        fs::write(&staging, value)?;
        fs::rename(&staging, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(key)) {
            Err(err) if err.kind() != ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }
}

/// Process-local store, used in tests and when persistence is disabled.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

/// Last resolved dataset, tagged with its owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedDataset {
    /// User the dataset was fetched for.
    pub user_id: UserId,
    /// When it was written.
    pub saved_at: DateTime<Utc>,
    /// Normalized snapshots.
    pub projection: ProjectionDataset,
}

/// Typed access to the identity and cache records.
#[derive(Debug)]
pub struct LocalState<S> {
    store: Arc<S>,
    user_key: String,
    projection_key: String,
}

impl<S> Clone for LocalState<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            user_key: self.user_key.clone(),
            projection_key: self.projection_key.clone(),
        }
    }
}

impl<S: LocalStore> LocalState<S> {
    /// Records under `namespace` in `store`.
    pub fn new(store: Arc<S>, namespace: &str) -> Self {
        Self {
            store,
            user_key: format!("{namespace}User"),
            projection_key: format!("{namespace}Projection"),
        }
    }

    fn read<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Result<Option<T>, StoreError> {
        self.store
            .load(key)?
            .map(|raw| serde_json::from_str(&raw))
            .transpose()
            .map_err(StoreError::from)
    }

    fn write<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let raw = serde_json::to_string(value)?;
        self.store.save(key, &raw)
    }
}

/// Store access runs on the blocking pool so file I/O never occupies a
/// runtime worker.
impl<S: LocalStore + 'static> LocalState<S> {
    /// The stored identity, if any.
    pub async fn identity(&self) -> Result<Option<AuthResponse>, StoreError> {
        self.off_thread(|state| state.read(&state.user_key)).await
    }

    /// Persist `identity` for the next session.
    pub async fn save_identity(&self, identity: &AuthResponse) -> Result<(), StoreError> {
        let identity = identity.clone();
        self.off_thread(move |state| state.write(&state.user_key, &identity))
            .await
    }

    /// Cached dataset for `user`; a cache owned by someone else is a miss.
    pub async fn cached_projection(
        &self,
        user: &UserId,
    ) -> Result<Option<CachedDataset>, StoreError> {
        let user = user.clone();
        self.off_thread(move |state| {
            let cached: Option<CachedDataset> = state.read(&state.projection_key)?;
            Ok(cached.filter(|entry| entry.user_id == user))
        })
        .await
    }

    /// Replace the cache with `projection` for `user`.
    pub async fn save_projection(
        &self,
        user: &UserId,
        projection: &ProjectionDataset,
    ) -> Result<(), StoreError> {
        let entry = CachedDataset {
            user_id: user.clone(),
            saved_at: Utc::now(),
            projection: projection.clone(),
        };
        self.off_thread(move |state| state.write(&state.projection_key, &entry))
            .await?;
        debug!(user = %user, years = projection.len(), "projection cached");
        Ok(())
    }

    /// Forget the identity and the cache.
    pub async fn clear(&self) -> Result<(), StoreError> {
        self.off_thread(|state| {
            state.store.remove(&state.user_key)?;
            state.store.remove(&state.projection_key)
        })
        .await
    }

    async fn off_thread<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Self) -> Result<T, StoreError> + Send + 'static,
    {
        let state = self.clone();
        tokio::task::spawn_blocking(move || op(&state)).await?
    }
}
