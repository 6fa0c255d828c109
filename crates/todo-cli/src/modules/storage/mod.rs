mod file;
mod keychain;

use std::sync::Arc;

use todo_session::ClientStorage;

use crate::cli_args::StorageKind;
use crate::modules::system::config::todo_dir;

pub(crate) use file::FileStorage;
pub(crate) use keychain::KeyringStorage;
#[cfg(test)]
pub(crate) use keychain::{clear_keyring_mock, lock_keyring_tests_async};

const SESSION_FILE: &str = "session.json";

/// Tokens of different servers live side by side; entries are keyed by
/// server origin plus the session's storage key.
pub(crate) fn scoped_key(scope: &str, key: &str) -> String {
    format!("{}::{}", scope.trim_end_matches('/'), key)
}

pub(crate) fn open_storage(kind: StorageKind, scope: &str) -> anyhow::Result<Arc<dyn ClientStorage>> {
    Ok(match kind {
        StorageKind::Keyring => Arc::new(KeyringStorage::new(scope)),
        StorageKind::File => Arc::new(FileStorage::new(todo_dir()?.join(SESSION_FILE), scope)),
    })
}
