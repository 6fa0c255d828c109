use std::sync::Arc;

use tracing::debug;

use crate::error::StorageError;
use crate::storage::ClientStorage;

/// Single durable slot for the session token. Only usable once the host is
/// interactive; the session manager enforces that.
#[derive(Clone)]
pub struct TokenStore {
    storage: Arc<dyn ClientStorage>,
    key: String,
}

impl TokenStore {
    pub fn new(storage: Arc<dyn ClientStorage>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    pub async fn load(&self) -> Result<Option<String>, StorageError> {
        let token = self.storage.get(&self.key).await?;
        Ok(token.filter(|value| !value.trim().is_empty()))
    }

    pub async fn save(&self, token: Option<&str>) -> Result<(), StorageError> {
        match token.filter(|value| !value.trim().is_empty()) {
            Some(token) => {
                self.storage.set(&self.key, token).await?;
                debug!(key = %self.key, "stored session token");
            }
            None => {
                self.storage.remove(&self.key).await?;
                debug!(key = %self.key, "removed session token");
            }
        }
        Ok(())
    }
}
