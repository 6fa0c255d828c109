#![allow(clippy::pedantic)]
#![allow(clippy::nursery)]
#![deny(clippy::unwrap_used)]
#![allow(clippy::missing_errors_doc)]

pub mod channel;
pub mod config;
pub mod deferred;
pub mod error;
pub mod http;
pub mod interceptor;
pub mod phase;
pub mod session;
pub mod storage;
pub mod store;
pub mod todo_api;

pub use crate::channel::{DetachedChannel, ResponseChannel};
pub use crate::config::SessionConfig;
pub use crate::deferred::{DeferredAction, DeferredQueue};
pub use crate::error::{ApiError, ChannelError, SessionError, StorageError};
pub use crate::interceptor::AuthInterceptor;
pub use crate::phase::RenderPhase;
pub use crate::session::SessionManager;
pub use crate::storage::{ClientStorage, MemoryStorage};
pub use crate::store::TokenStore;
pub use crate::todo_api::TodoClient;
