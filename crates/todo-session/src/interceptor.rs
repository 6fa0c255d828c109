use std::sync::Arc;

use chrono::Utc;
use reqwest::{Method, StatusCode};
use tracing::{debug, info};

use todo_core::decode;

use crate::error::ApiError;
use crate::session::SessionManager;

/// Sends API calls with the session's bearer token, refreshing it first when
/// it has expired. A call never goes out with a token that failed to refresh.
#[derive(Clone)]
pub struct AuthInterceptor {
    client: reqwest::Client,
    session: Arc<SessionManager>,
}

impl AuthInterceptor {
    pub fn new(client: reqwest::Client, session: Arc<SessionManager>) -> Self {
        Self { client, session }
    }

    #[must_use]
    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    /// `path` is relative to the API base (`{addr}/api`).
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        payload: Option<serde_json::Value>,
    ) -> Result<reqwest::Response, ApiError> {
        let url = self.session.config().api_url(path);
        let mut refreshed = false;
        let mut token = self.session.current_token().await;

        if let Some(current) = token.as_deref() {
            let skew = self.session.config().refresh_skew();
            if decode(current).is_expired_at(Utc::now(), skew) {
                info!(method = %method, url = %url, "session token expired; refreshing");
                refreshed = true;
                token = self.refresh_token().await?;
            }
        }

        let response = self
            .send_once(method.clone(), &url, token.as_deref(), payload.clone())
            .await?;
        if response.status() != StatusCode::UNAUTHORIZED || refreshed || token.is_none() {
            return Ok(response);
        }

        info!(
            method = %method,
            url = %url,
            "http request unauthorized; attempting token refresh"
        );
        let token = self.refresh_token().await?;
        self.send_once(method, &url, token.as_deref(), payload).await
    }

    async fn refresh_token(&self) -> Result<Option<String>, ApiError> {
        if !self.session.refresh().await {
            return Err(ApiError::ReauthenticationRequired);
        }
        Ok(self.session.current_token().await)
    }

    async fn send_once(
        &self,
        method: Method,
        url: &str,
        token: Option<&str>,
        payload: Option<serde_json::Value>,
    ) -> Result<reqwest::Response, ApiError> {
        let method_clone = method.clone();
        let mut builder = self.client.request(method, url);
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        if let Some(payload) = payload {
            builder = builder.json(&payload);
        }
        debug!(method = %method_clone, url = %url, authenticated = token.is_some(), "http request");
        let start = std::time::Instant::now();
        let response = builder.send().await?;
        debug!(
            method = %method_clone,
            url = %url,
            status = %response.status(),
            elapsed_ms = start.elapsed().as_millis(),
            "http response"
        );
        Ok(response)
    }
}
