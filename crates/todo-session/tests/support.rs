#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::{json, Value};
use todo_core::Identity;
use todo_session::{
    ChannelError, ClientStorage, MemoryStorage, ResponseChannel, SessionConfig, SessionManager,
    StorageError,
};

pub const STORAGE_KEY: &str = "authToken";

pub fn token_for(claims: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.c2lnbmF0dXJl")
}

/// Token for subject `subject` expiring `minutes` from now (negative for
/// already expired).
pub fn token_expiring_in(subject: &str, minutes: i64) -> String {
    let exp = chrono::Utc::now().timestamp() + minutes * 60;
    token_for(&json!({
        "nameid": subject,
        "unique_name": format!("user-{subject}"),
        "role": ["User"],
        "exp": exp,
    }))
}

#[derive(Default)]
pub struct RecordingChannel {
    started: AtomicBool,
    events: Mutex<Vec<String>>,
}

impl RecordingChannel {
    pub fn started() -> Self {
        let channel = Self::default();
        channel.started.store(true, Ordering::SeqCst);
        channel
    }

    pub fn finish_response(&self) {
        self.started.store(false, Ordering::SeqCst);
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().expect("events lock").clone()
    }
}

#[async_trait]
impl ResponseChannel for RecordingChannel {
    fn has_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    async fn sign_in(&self, identity: &Identity) -> Result<(), ChannelError> {
        let subject = identity.subject_id().unwrap_or("anonymous").to_string();
        self.events
            .lock()
            .expect("events lock")
            .push(format!("sign_in:{subject}"));
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), ChannelError> {
        self.events
            .lock()
            .expect("events lock")
            .push("sign_out".to_string());
        Ok(())
    }
}

/// Memory storage whose next `set` stalls until released, to hold a write
/// in flight while the test does something else.
#[derive(Default)]
pub struct GatedStorage {
    inner: Arc<MemoryStorage>,
    hold: AtomicBool,
    writing: Notify,
    release: Notify,
}

impl GatedStorage {
    pub fn hold_next_write(&self) {
        self.hold.store(true, Ordering::SeqCst);
    }

    /// Resolves once a held write has started.
    pub async fn write_started(&self) {
        self.writing.notified().await;
    }

    pub fn release_write(&self) {
        self.release.notify_one();
    }
}

#[async_trait]
impl ClientStorage for GatedStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.hold.swap(false, Ordering::SeqCst) {
            self.writing.notify_one();
            self.release.notified().await;
        }
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.inner.remove(key).await
    }
}

pub struct Harness {
    pub session: Arc<SessionManager>,
    pub storage: Arc<MemoryStorage>,
    pub channel: Arc<RecordingChannel>,
}

pub fn harness(addr: &str) -> Harness {
    harness_with(addr, Arc::new(MemoryStorage::new()), RecordingChannel::default())
}

pub fn harness_with(
    addr: &str,
    storage: Arc<MemoryStorage>,
    channel: RecordingChannel,
) -> Harness {
    let channel = Arc::new(channel);
    let session = Arc::new(SessionManager::new(
        SessionConfig::new(addr),
        reqwest::Client::new(),
        storage.clone(),
        channel.clone(),
    ));
    Harness {
        session,
        storage,
        channel,
    }
}

pub fn gated_harness(addr: &str, channel: RecordingChannel) -> (Harness, Arc<GatedStorage>) {
    let gated = Arc::new(GatedStorage::default());
    let channel = Arc::new(channel);
    let session = Arc::new(SessionManager::new(
        SessionConfig::new(addr),
        reqwest::Client::new(),
        gated.clone(),
        channel.clone(),
    ));
    let harness = Harness {
        session,
        storage: gated.inner.clone(),
        channel,
    };
    (harness, gated)
}

pub async fn interactive_harness(addr: &str) -> Harness {
    let harness = harness(addr);
    harness.session.notify_render_phase_interactive().await;
    harness
}
