//! Persistent identity store.
//!
//! Mirrors the signed-in identity to a JSON file so a restart comes
//! back signed in without re-prompting.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, warn};

use crate::error::{ClientError, Result};
use crate::model::Identity;

/// File-backed store for the current identity.
#[derive(Debug, Clone)]
pub struct IdentityStore {
    path: PathBuf,
}

impl IdentityStore {
    /// Create a store persisting to the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted identity. Absent or corrupt data reads as
    /// none; restoration is best-effort by contract.
    pub async fn load(&self) -> Option<Identity> {
        let bytes = fs::read(&self.path).await.ok()?;
        match serde_json::from_slice(&bytes) {
            Ok(identity) => Some(identity),
            Err(err) => {
                warn!(path = %self.path.display(), %err, "ignoring unreadable identity file");
                None
            }
        }
    }

    /// Persist the identity, creating parent directories as needed.
    pub async fn save(&self, identity: &Identity) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec_pretty(identity)
            .map_err(|err| ClientError::Storage(err.to_string()))?;
        fs::write(&self.path, json).await?;
        debug!(path = %self.path.display(), "persisted identity");
        Ok(())
    }

    /// Remove the persisted identity. A missing file is already clear.
    pub async fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> IdentityStore {
        IdentityStore::new(dir.path().join("identity.json"))
    }

    #[tokio::test]
    async fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let identity = Identity {
            id: 1,
            username: "alice".to_string(),
        };

        store.save(&identity).await.unwrap();
        assert_eq!(store.load().await, Some(identity));
    }

    #[tokio::test]
    async fn test_absent_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(store_in(&dir).load().await, None);
    }

    #[tokio::test]
    async fn test_corrupt_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), b"{not json").await.unwrap();
        assert_eq!(store.load().await, None);
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let identity = Identity {
            id: 1,
            username: "alice".to_string(),
        };

        store.save(&identity).await.unwrap();
        store.clear().await.unwrap();
        store.clear().await.unwrap();
        assert_eq!(store.load().await, None);
    }
}
