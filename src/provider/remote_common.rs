//! Shared utilities for the HTTP-backed adapters: status mapping, reply
//! decoding, and optional credential lookup.

use crate::error::{AdapterError, Result};
use serde_json::Value;

/// Longest slice of an error body carried into an error message.
const MAX_ERROR_BODY: usize = 256;

/// Map a non-2xx response to [`AdapterError::Api`], including the status and
/// the head of the body. Returns `Ok(response)` when the status is 2xx.
pub(crate) async fn check_http_status(
    backend: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let body: String = body.chars().take(MAX_ERROR_BODY).collect();
    Err(AdapterError::Api(if body.is_empty() {
        format!("{} returned {}", backend, status)
    } else {
        format!("{} returned {}: {}", backend, status, body)
    }))
}

/// Decode a successful response body as JSON.
pub(crate) async fn decode_json(backend: &str, response: reqwest::Response) -> Result<Value> {
    let bytes = response
        .bytes()
        .await
        .map_err(|e| AdapterError::Api(format!("{}: {}", backend, e)))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| AdapterError::MalformedResponse(format!("{} reply is not JSON: {}", backend, e)))
}

/// Read an optional credential from the environment. Unset and empty values
/// both count as absent.
pub(crate) fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
