//! Response checking shared by the posts and AI clients.

use reqwest::Response;
use scribe_sync::RemoteFailure;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub(crate) fn build_client() -> Result<reqwest::Client, RemoteFailure> {
    reqwest::Client::builder()
        .build()
        .map_err(|e| RemoteFailure::Transport(format!("failed to build http client: {e}")))
}

pub(crate) fn transport(err: reqwest::Error) -> RemoteFailure {
    if err.is_decode() {
        RemoteFailure::Decode(err.to_string())
    } else {
        RemoteFailure::Transport(err.to_string())
    }
}

/// Pass successful responses through; turn anything else into a status
/// failure carrying the server's `detail` message when it sent one.
pub(crate) async fn check(response: Response) -> Result<Response, RemoteFailure> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(RemoteFailure::status(status.as_u16(), detail_from_body(&body)))
}

pub(crate) async fn json<T: DeserializeOwned>(response: Response) -> Result<T, RemoteFailure> {
    let response = check(response).await?;
    response.json().await.map_err(transport)
}

/// Extract `detail` from an error body. Validation errors carry a list
/// instead of a string; those are passed through as compact JSON.
pub(crate) fn detail_from_body(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        Value::String(detail) => Some(detail.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}
