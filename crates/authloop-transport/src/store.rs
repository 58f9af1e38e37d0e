//! Persistent storage for the last resolved user id.
//!
//! The session reads the remembered id once at startup, so the very first
//! status probe already knows who was logged in before a reload, and
//! writes it every time an identity is resolved.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use authloop_protocol::{Codec, JsonCodec, UserId};
use serde::{Deserialize, Serialize};

use crate::TransportError;

/// Remembers one user id across restarts of the execution context.
pub trait IdentityStore: Send + Sync + 'static {
    /// Returns the remembered id, or `None` if nothing was stored (or the
    /// last stored identity was anonymous).
    fn load(
        &self,
    ) -> impl std::future::Future<Output = Result<Option<UserId>, TransportError>> + Send;

    /// Replaces the remembered id.
    fn save(
        &self,
        user_id: Option<UserId>,
    ) -> impl std::future::Future<Output = Result<(), TransportError>> + Send;
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// Keeps the id in memory. Clones share the same slot, so a test can hold
/// one clone and inspect what the worker wrote through another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slot: Arc<Mutex<Option<UserId>>>,
}

impl MemoryStore {
    /// A store that already remembers `user_id`.
    pub fn with_user(user_id: UserId) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(user_id))),
        }
    }

    /// The id currently stored.
    pub fn current(&self) -> Option<UserId> {
        *self.slot.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl IdentityStore for MemoryStore {
    async fn load(&self) -> Result<Option<UserId>, TransportError> {
        Ok(self.current())
    }

    async fn save(&self, user_id: Option<UserId>) -> Result<(), TransportError> {
        *self.slot.lock().unwrap_or_else(|p| p.into_inner()) = user_id;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FileStore
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
struct Record {
    user_id: Option<UserId>,
}

/// Keeps the id in a small JSON file: `{"user_id": 42}`.
///
/// Writes go to a sibling `.tmp` file first and are then renamed over the
/// target, so a crash mid-write never leaves a truncated record behind.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    codec: JsonCodec,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            codec: JsonCodec,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

impl IdentityStore for FileStore {
    async fn load(&self) -> Result<Option<UserId>, TransportError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(TransportError::Store(e)),
        };
        let record: Record = self.codec.decode(&bytes)?;
        Ok(record.user_id)
    }

    async fn save(&self, user_id: Option<UserId>) -> Result<(), TransportError> {
        let bytes = self.codec.encode(&Record { user_id })?;
        let tmp = self.tmp_path();
        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(TransportError::Store)?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(TransportError::Store)?;
        tracing::debug!(path = %self.path.display(), ?user_id, "identity saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rand::Rng;

    use super::*;

    fn scratch_path() -> PathBuf {
        let n: u64 = rand::rng().random();
        std::env::temp_dir().join(format!("authloop-store-{n:016x}.json"))
    }

    #[tokio::test]
    async fn test_memory_store_round_trips_and_shares_between_clones() {
        let store = MemoryStore::default();
        let observer = store.clone();

        store.save(Some(UserId(5))).await.unwrap();

        assert_eq!(observer.current(), Some(UserId(5)));
        assert_eq!(store.load().await.unwrap(), Some(UserId(5)));
    }

    #[tokio::test]
    async fn test_file_store_missing_file_loads_none() {
        let store = FileStore::new(scratch_path());

        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_store_save_then_load_in_new_instance() {
        let path = scratch_path();
        FileStore::new(&path).save(Some(UserId(42))).await.unwrap();

        let reopened = FileStore::new(&path);

        assert_eq!(reopened.load().await.unwrap(), Some(UserId(42)));
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_file_store_corrupt_file_returns_protocol_error() {
        let path = scratch_path();
        std::fs::write(&path, b"not json").unwrap();

        let result = FileStore::new(&path).load().await;

        assert!(matches!(result, Err(TransportError::Protocol(_))));
        let _ = std::fs::remove_file(&path);
    }
}
