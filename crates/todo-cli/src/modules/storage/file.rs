use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use todo_session::{ClientStorage, StorageError};

use super::scoped_key;

/// Session storage in a JSON map on disk, for machines without a keychain.
pub(crate) struct FileStorage {
    path: PathBuf,
    scope: String,
}

impl FileStorage {
    pub(crate) fn new(path: PathBuf, scope: &str) -> Self {
        Self {
            path,
            scope: scope.to_string(),
        }
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>, StorageError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = fs::read_to_string(&self.path).map_err(|err| {
            StorageError::backend(format!("failed to read {}: {err}", self.path.display()))
        })?;
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&contents).map_err(|err| {
            StorageError::backend(format!("failed to parse {}: {err}", self.path.display()))
        })
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|err| {
                StorageError::backend(format!("failed to create {}: {err}", parent.display()))
            })?;
        }
        let contents = serde_json::to_string_pretty(entries)
            .map_err(|err| StorageError::backend(err.to_string()))?;
        fs::write(&self.path, contents).map_err(|err| {
            StorageError::backend(format!("failed to write {}: {err}", self.path.display()))
        })
    }
}

#[async_trait]
impl ClientStorage for FileStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_entries()?.remove(&scoped_key(&self.scope, key)))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.read_entries()?;
        entries.insert(scoped_key(&self.scope, key), value.to_string());
        self.write_entries(&entries)?;
        debug!(path = %self.path.display(), key = %key, "stored session token in file");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.read_entries()?;
        if entries.remove(&scoped_key(&self.scope, key)).is_some() {
            self.write_entries(&entries)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn file_roundtrip_keeps_other_servers() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join("session.json");
        let local = FileStorage::new(path.clone(), "http://localhost:5208");
        let remote = FileStorage::new(path.clone(), "https://todo.example.com");

        assert_eq!(local.get("authToken").await?, None);
        local.set("authToken", "local-token").await?;
        remote.set("authToken", "remote-token").await?;
        assert_eq!(local.get("authToken").await?, Some("local-token".to_string()));

        local.remove("authToken").await?;
        assert_eq!(local.get("authToken").await?, None);
        assert_eq!(remote.get("authToken").await?, Some("remote-token".to_string()));

        let on_disk: BTreeMap<String, String> =
            serde_json::from_str(&fs::read_to_string(&path)?)?;
        assert_eq!(on_disk.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn corrupt_file_is_a_backend_error() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("session.json");
        fs::write(&path, "not json")?;
        let storage = FileStorage::new(path, "http://localhost:5208");
        let err = storage.get("authToken").await.expect_err("corrupt");
        assert!(matches!(err, StorageError::Backend { .. }));
        Ok(())
    }
}
