use reqwest::StatusCode;
use serde::de::DeserializeOwned;

pub(crate) async fn status_parts(response: reqwest::Response) -> (StatusCode, String) {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    (status, body)
}

pub(crate) fn parse_json_body<T: DeserializeOwned>(
    status: StatusCode,
    body: &str,
) -> Result<T, String> {
    serde_json::from_str::<T>(body).map_err(|err| {
        let snippet: String = body.chars().take(512).collect();
        format!("error decoding response body: {err} (status {status}) body: {snippet}")
    })
}

/// Body of a plain-text endpoint. A JSON string literal is unquoted.
pub(crate) fn text_value(body: &str) -> String {
    match serde_json::from_str::<String>(body) {
        Ok(value) => value,
        Err(_) => body.trim().to_string(),
    }
}
