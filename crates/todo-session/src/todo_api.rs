use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use tracing::warn;

use todo_core::TodoItem;

use crate::error::ApiError;
use crate::http::{parse_json_body, status_parts};
use crate::interceptor::AuthInterceptor;

const TODO_PATH: &str = "todo";

/// Typed client for the to-do CRUD endpoints. Every call goes through the
/// auth interceptor; anonymous calls are forwarded as-is.
#[derive(Clone)]
pub struct TodoClient {
    http: AuthInterceptor,
}

impl TodoClient {
    pub fn new(http: AuthInterceptor) -> Self {
        Self { http }
    }

    pub async fn list(&self) -> Result<Vec<TodoItem>, ApiError> {
        let response = self.http.send(Method::GET, TODO_PATH, None).await?;
        read_json(response).await
    }

    pub async fn get(&self, id: i64) -> Result<Option<TodoItem>, ApiError> {
        let response = self.http.send(Method::GET, &item_path(id), None).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        read_json(response).await.map(Some)
    }

    pub async fn create(&self, item: &TodoItem) -> Result<TodoItem, ApiError> {
        let response = self
            .http
            .send(Method::POST, TODO_PATH, Some(to_value(item)?))
            .await?;
        read_json(response).await
    }

    pub async fn update(&self, id: i64, item: &TodoItem) -> Result<(), ApiError> {
        let response = self
            .http
            .send(Method::PUT, &item_path(id), Some(to_value(item)?))
            .await?;
        ensure_success(response).await
    }

    /// Returns whether the API accepted the delete.
    pub async fn delete(&self, id: i64) -> Result<bool, ApiError> {
        let response = self.http.send(Method::DELETE, &item_path(id), None).await?;
        let status = response.status();
        if !status.is_success() {
            warn!(id, status = %status, "todo delete rejected");
        }
        Ok(status.is_success())
    }

    pub async fn set_done(&self, id: i64) -> Result<bool, ApiError> {
        self.set_completed(id, true).await
    }

    pub async fn set_not_done(&self, id: i64) -> Result<bool, ApiError> {
        self.set_completed(id, false).await
    }

    async fn set_completed(&self, id: i64, completed: bool) -> Result<bool, ApiError> {
        let Some(mut item) = self.get(id).await? else {
            return Ok(false);
        };
        item.is_completed = completed;
        self.update(id, &item).await?;
        Ok(true)
    }
}

fn item_path(id: i64) -> String {
    format!("{TODO_PATH}/{id}")
}

fn to_value(item: &TodoItem) -> Result<serde_json::Value, ApiError> {
    serde_json::to_value(item).map_err(|err| ApiError::Request(err.to_string()))
}

async fn ensure_success(response: reqwest::Response) -> Result<(), ApiError> {
    if response.status().is_success() {
        return Ok(());
    }
    let (status, body) = status_parts(response).await;
    Err(ApiError::Status { status, body })
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let (status, body) = status_parts(response).await;
    if !status.is_success() {
        return Err(ApiError::Status { status, body });
    }
    parse_json_body(status, &body).map_err(ApiError::Decode)
}
