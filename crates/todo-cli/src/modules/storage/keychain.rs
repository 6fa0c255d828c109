#[cfg(test)]
use std::collections::HashMap;
#[cfg(test)]
use std::sync::{Mutex, OnceLock};

use async_trait::async_trait;
#[cfg(test)]
use tokio::sync::Mutex as TokioMutex;
use tracing::debug;
#[cfg(not(test))]
use tracing::warn;

use todo_session::{ClientStorage, StorageError};

use super::scoped_key;

#[cfg(not(test))]
const KEYRING_SERVICE: &str = "todo-cli";

/// Session storage in the OS keychain, one entry per server and key.
pub(crate) struct KeyringStorage {
    scope: String,
}

impl KeyringStorage {
    pub(crate) fn new(scope: &str) -> Self {
        Self {
            scope: scope.to_string(),
        }
    }
}

#[async_trait]
impl ClientStorage for KeyringStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        keyring_get(&scoped_key(&self.scope, key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        keyring_set(&scoped_key(&self.scope, key), value)?;
        debug!(scope = %self.scope, key = %key, "stored session token in keyring");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        keyring_delete(&scoped_key(&self.scope, key))
    }
}

#[cfg(test)]
fn keyring_store() -> &'static Mutex<HashMap<String, String>> {
    static STORE: OnceLock<Mutex<HashMap<String, String>>> = OnceLock::new();
    STORE.get_or_init(|| Mutex::new(HashMap::new()))
}

#[cfg(test)]
static KEYRING_TEST_LOCK: OnceLock<TokioMutex<()>> = OnceLock::new();

#[cfg(test)]
pub(crate) async fn lock_keyring_tests_async() -> tokio::sync::MutexGuard<'static, ()> {
    KEYRING_TEST_LOCK
        .get_or_init(|| TokioMutex::new(()))
        .lock()
        .await
}

#[cfg(not(test))]
fn keyring_entry(account: &str) -> Result<keyring::Entry, StorageError> {
    keyring::Entry::new(KEYRING_SERVICE, account)
        .map_err(|err| StorageError::backend(format!("failed to access keyring: {err}")))
}

#[cfg(not(test))]
fn keyring_set(account: &str, value: &str) -> Result<(), StorageError> {
    let entry = keyring_entry(account)?;
    entry
        .set_password(value)
        .map_err(|err| StorageError::backend(format!("failed to store session token: {err}")))
}

#[cfg(not(test))]
fn keyring_get(account: &str) -> Result<Option<String>, StorageError> {
    let entry = keyring_entry(account)?;
    match entry.get_password() {
        Ok(value) => Ok(Some(value)),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(keyring::Error::PlatformFailure(err)) | Err(keyring::Error::NoStorageAccess(err)) => {
            warn!(account = %account, "keyring unavailable: {err}");
            Err(StorageError::Unavailable)
        }
        Err(err) => Err(StorageError::backend(format!(
            "failed to load session token from keychain for '{account}': {err}"
        ))),
    }
}

#[cfg(not(test))]
fn keyring_delete(account: &str) -> Result<(), StorageError> {
    let entry = keyring_entry(account)?;
    match entry.delete_password() {
        Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(err) => {
            warn!(account = %account, "failed to delete session token: {err}");
            Ok(())
        }
    }
}

#[cfg(test)]
fn keyring_set(account: &str, value: &str) -> Result<(), StorageError> {
    let mut store = keyring_store()
        .lock()
        .map_err(|_| StorageError::backend("failed to lock keyring store"))?;
    store.insert(account.to_string(), value.to_string());
    Ok(())
}

#[cfg(test)]
fn keyring_get(account: &str) -> Result<Option<String>, StorageError> {
    let store = keyring_store()
        .lock()
        .map_err(|_| StorageError::backend("failed to lock keyring store"))?;
    Ok(store.get(account).cloned())
}

#[cfg(test)]
fn keyring_delete(account: &str) -> Result<(), StorageError> {
    let mut store = keyring_store()
        .lock()
        .map_err(|_| StorageError::backend("failed to lock keyring store"))?;
    store.remove(account);
    Ok(())
}

#[cfg(test)]
pub(crate) fn clear_keyring_mock() {
    if let Ok(mut map) = keyring_store().lock() {
        map.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn keyring_roundtrip_is_scoped_by_server() -> anyhow::Result<()> {
        let _guard = lock_keyring_tests_async().await;
        clear_keyring_mock();
        let local = KeyringStorage::new("http://localhost:5208/");
        let remote = KeyringStorage::new("https://todo.example.com");

        local.set("authToken", "a.b.c").await?;
        assert_eq!(local.get("authToken").await?, Some("a.b.c".to_string()));
        assert_eq!(remote.get("authToken").await?, None);

        local.remove("authToken").await?;
        assert_eq!(local.get("authToken").await?, None);
        local.remove("authToken").await?;
        Ok(())
    }
}
