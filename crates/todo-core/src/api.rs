use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Token response of the login and refresh endpoints. The API serializes the
/// field as either `token` or `Token`.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    #[serde(default, alias = "Token")]
    pub token: Option<String>,
}

impl AuthResponse {
    /// The issued token, if present and non-blank.
    #[must_use]
    pub fn into_token(self) -> Option<String> {
        self.token.filter(|token| !token.trim().is_empty())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoItem {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub is_completed: bool,
}

impl TodoItem {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: 0,
            title: title.into(),
            is_completed: false,
        }
    }
}
