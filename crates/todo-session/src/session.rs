use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use todo_core::{try_decode, AuthResponse, Identity, LoginRequest, RefreshRequest};

use crate::channel::ResponseChannel;
use crate::config::SessionConfig;
use crate::deferred::DeferredQueue;
use crate::error::SessionError;
use crate::http::{parse_json_body, status_parts, text_value};
use crate::phase::{PhaseGate, RenderPhase};
use crate::storage::ClientStorage;
use crate::store::TokenStore;

const LOGIN_PATH: &str = "User/login";
const REFRESH_HANDLE_PATH: &str = "User/get-refresh-token";
const REFRESH_PATH: &str = "User/refresh-token";
const REFRESH_EXCHANGE_ATTEMPTS: u32 = 2;

#[derive(Debug, Clone, Default)]
struct TokenSlot {
    loaded: bool,
    token: Option<String>,
}

enum SignChange {
    SignIn(Identity),
    SignOut,
    Keep,
}

/// Storage write plus optional sign-in/sign-out, run now or deferred as one
/// unit so writes keep their order.
struct SideEffect {
    token: Option<String>,
    sign: SignChange,
    store: TokenStore,
    channel: Arc<dyn ResponseChannel>,
}

impl SideEffect {
    async fn run(self) {
        if let Err(err) = self.store.save(self.token.as_deref()).await {
            warn!(event = "session_persist_failed", error = %err, "Failed to persist session token");
        }
        match self.sign {
            SignChange::SignIn(identity) => match self.channel.sign_in(&identity).await {
                Ok(()) => info!(event = "session_signed_in", "User signed in"),
                Err(err) => warn!(event = "session_sign_in_failed", error = %err, "Sign-in failed"),
            },
            SignChange::SignOut => match self.channel.sign_out().await {
                Ok(()) => info!(event = "session_signed_out", "User signed out"),
                Err(err) => {
                    warn!(event = "session_sign_out_failed", error = %err, "Sign-out failed")
                }
            },
            SignChange::Keep => {}
        }
    }
}

/// Owns the session credential and keeps it valid across the host's
/// prerender/interactive lifecycle.
///
/// Nothing here returns an error to the caller: login and refresh report
/// success as a bool, state queries fall back to the anonymous identity, and
/// every failure is logged.
pub struct SessionManager {
    config: SessionConfig,
    client: reqwest::Client,
    store: TokenStore,
    channel: Arc<dyn ResponseChannel>,
    deferred: DeferredQueue,
    phase: PhaseGate,
    slot: RwLock<TokenSlot>,
    observers: watch::Sender<Identity>,
}

impl SessionManager {
    pub fn new(
        config: SessionConfig,
        client: reqwest::Client,
        storage: Arc<dyn ClientStorage>,
        channel: Arc<dyn ResponseChannel>,
    ) -> Self {
        let store = TokenStore::new(storage, config.storage_key.clone());
        let (observers, _) = watch::channel(Identity::anonymous());
        Self {
            config,
            client,
            store,
            channel,
            deferred: DeferredQueue::new(),
            phase: PhaseGate::new(RenderPhase::Prerendering),
            slot: RwLock::new(TokenSlot::default()),
            observers,
        }
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[must_use]
    pub fn render_phase(&self) -> RenderPhase {
        self.phase.phase()
    }

    #[must_use]
    pub fn pending_actions(&self) -> usize {
        self.deferred.len()
    }

    /// Receives the identity after every login, logout and refresh.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Identity> {
        self.observers.subscribe()
    }

    pub async fn authentication_state(&self) -> Identity {
        debug!("getting authentication state");
        let Some(token) = self.current_token().await else {
            return Identity::anonymous();
        };
        match try_decode(&token) {
            Ok(identity) => identity,
            Err(err) => {
                warn!(event = "session_token_decode_failed", error = %err, "Error parsing token claims");
                Identity::anonymous()
            }
        }
    }

    /// The credential to present on API calls, loading it from the token store
    /// on first use once the host is interactive.
    pub async fn current_token(&self) -> Option<String> {
        {
            let slot = self.read_slot();
            if slot.loaded {
                return slot.token;
            }
        }
        if !self.phase.is_interactive() {
            return None;
        }
        match self.store.load().await {
            Ok(token) => self.cache_loaded(token),
            Err(err) => {
                warn!(event = "session_token_load_failed", error = %err, "Failed to load session token");
                None
            }
        }
    }

    pub async fn login(&self, username: &str, password: &str) -> bool {
        info!(event = "login_attempt", username = %username, "Attempting to log in user");
        let (token, identity) = match self.request_login(username, password).await {
            Ok(issued) => issued,
            Err(err) => {
                warn!(event = "login_failed", username = %username, error = %err, "Login failed");
                return false;
            }
        };

        self.commit(Some(token), identity.clone(), SignChange::SignIn(identity))
            .await;
        info!(event = "login_succeeded", username = %username, "User logged in");
        true
    }

    pub async fn logout(&self) {
        info!(event = "logout", "Logging out user");
        self.commit(None, Identity::anonymous(), SignChange::SignOut)
            .await;
    }

    /// Exchanges the server-issued refresh handle for a new token. On failure
    /// the current token is left in place and `false` is returned.
    pub async fn refresh(&self) -> bool {
        let (token, identity) = match self.request_refresh().await {
            Ok(issued) => issued,
            Err(err) => {
                warn!(event = "refresh_failed", error = %err, "Token refresh failed");
                return false;
            }
        };
        self.commit(Some(token), identity, SignChange::Keep).await;
        info!(event = "refresh_succeeded", "Session token refreshed");
        true
    }

    pub async fn notify_render_phase_interactive(&self) {
        if self.phase.enter_interactive() {
            info!(event = "render_phase_interactive", pending = self.deferred.len(), "Prerendering complete");
        }
        self.deferred.drain_all().await;
    }

    /// Per-render hook: runs the oldest deferred action once interactive.
    pub async fn on_after_render(&self) -> bool {
        if !self.phase.is_interactive() {
            return false;
        }
        self.deferred.drain_one().await
    }

    /// Runs `action` behind any session writes still waiting. Before the host
    /// is interactive, or while a response is in flight, it is only queued.
    pub async fn defer<F, Fut>(&self, action: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if self.phase.is_interactive() && !self.channel.has_started() {
            self.deferred.run_in_order(action).await;
        } else {
            debug!(phase = ?self.phase.phase(), "host action deferred");
            self.deferred.enqueue(action);
        }
    }

    /// Flushes deferred work that can still run. Actions queued while the host
    /// never became interactive cannot reach storage and are reported.
    pub async fn shutdown(&self) {
        if self.phase.is_interactive() {
            self.deferred.drain_all().await;
            return;
        }
        let stranded = self.deferred.len();
        if stranded > 0 {
            warn!(
                event = "deferred_actions_stranded",
                count = stranded,
                "Session closed before the host became interactive"
            );
        }
    }

    /// Swaps the in-memory token and queues the matching storage write under
    /// one lock, so concurrent callers persist in the order memory changed.
    async fn commit(&self, token: Option<String>, identity: Identity, sign: SignChange) {
        let effect = SideEffect {
            token: token.clone(),
            sign,
            store: self.store.clone(),
            channel: self.channel.clone(),
        };
        let must_drain = {
            let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
            *slot = TokenSlot {
                loaded: true,
                token,
            };
            self.observers.send_replace(identity);
            if !self.phase.is_interactive() || self.channel.has_started() {
                debug!(
                    phase = ?self.phase.phase(),
                    "response already started or storage unavailable; deferring session write"
                );
                self.deferred.enqueue(move || effect.run());
                false
            } else {
                self.deferred.submit(move || effect.run())
            }
        };
        if must_drain {
            self.deferred.drain_all().await;
        }
    }

    async fn request_login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<(String, Identity), SessionError> {
        let payload = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let response = self
            .client
            .post(self.config.api_url(LOGIN_PATH))
            .json(&payload)
            .send()
            .await?;
        self.token_from_response(response).await
    }

    async fn request_refresh(&self) -> Result<(String, Identity), SessionError> {
        let handle = self.fetch_refresh_handle().await?;
        let payload = RefreshRequest {
            refresh_token: handle,
        };
        let mut attempt = 1;
        loop {
            match self.exchange_refresh(&payload).await {
                Ok(issued) => return Ok(issued),
                Err(err) if attempt < REFRESH_EXCHANGE_ATTEMPTS && err.is_retryable() => {
                    debug!(attempt, error = %err, "refresh exchange failed; retrying");
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn fetch_refresh_handle(&self) -> Result<String, SessionError> {
        let response = self
            .client
            .get(self.config.api_url(REFRESH_HANDLE_PATH))
            .send()
            .await?;
        let (status, body) = status_parts(response).await;
        if !status.is_success() {
            return Err(SessionError::Status { status, body });
        }
        let handle = text_value(&body);
        if handle.is_empty() {
            return Err(SessionError::MissingRefreshHandle);
        }
        Ok(handle)
    }

    async fn exchange_refresh(
        &self,
        payload: &RefreshRequest,
    ) -> Result<(String, Identity), SessionError> {
        let response = self
            .client
            .post(self.config.api_url(REFRESH_PATH))
            .json(payload)
            .send()
            .await?;
        self.token_from_response(response).await
    }

    /// An issued token must carry readable claims; one that decodes to nothing
    /// is rejected like a missing token.
    async fn token_from_response(
        &self,
        response: reqwest::Response,
    ) -> Result<(String, Identity), SessionError> {
        let (status, body) = status_parts(response).await;
        if !status.is_success() {
            return Err(SessionError::Status { status, body });
        }
        let auth: AuthResponse = parse_json_body(status, &body).map_err(SessionError::Decode)?;
        let token = auth.into_token().ok_or(SessionError::MissingToken)?;
        let identity =
            try_decode(&token).map_err(|err| SessionError::InvalidToken(err.to_string()))?;
        if !identity.is_authenticated() {
            return Err(SessionError::InvalidToken("token carries no claims".to_string()));
        }
        Ok((token, identity))
    }

    fn read_slot(&self) -> TokenSlot {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Caches a token read from storage unless login/logout got there first.
    fn cache_loaded(&self, token: Option<String>) -> Option<String> {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        if !slot.loaded {
            *slot = TokenSlot {
                loaded: true,
                token,
            };
        }
        slot.token.clone()
    }
}
