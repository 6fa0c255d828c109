use std::sync::Arc;

use serde::{Deserialize, Serialize};
use todo_session::{SessionManager, TodoClient};

use super::args::StorageKind;

#[derive(Serialize, Deserialize, Default, Debug, PartialEq, Eq)]
pub struct CliConfig {
    #[serde(default)]
    pub addr: Option<String>,
    #[serde(default)]
    pub storage: Option<StorageKind>,
}

pub struct CommandContext {
    pub session: Arc<SessionManager>,
    pub todos: TodoClient,
}
