//! Shared request plumbing for the HTTP-backed providers.

use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::provider::LlmError;

pub(crate) fn build_client(timeout: Duration) -> Result<reqwest::Client, LlmError> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

/// POST a JSON body and return the decoded JSON response.
///
/// Maps 429 to [`LlmError::RateLimited`], 408/504 and client-side timeouts to
/// [`LlmError::Timeout`], and any other non-200 status to [`LlmError::ApiError`].
pub(crate) async fn post_json(
    request: reqwest::RequestBuilder,
    body: &Value,
) -> Result<Value, LlmError> {
    let response = request
        .header("Content-Type", "application/json")
        .json(body)
        .send()
        .await
        .map_err(classify_transport)?;

    let status = response.status().as_u16();
    match status {
        200 => {}
        429 => return Err(LlmError::RateLimited { status }),
        408 | 504 => return Err(LlmError::Timeout),
        _ => {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError { status, body });
        }
    }

    let resp: Value = response.json().await.map_err(classify_transport)?;
    debug!(status, "provider response received");
    Ok(resp)
}

/// Pull a string out of a JSON response by pointer, e.g. `/content/0/text`.
pub(crate) fn text_at(resp: &Value, pointer: &str) -> Result<String, LlmError> {
    resp.pointer(pointer)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| LlmError::ParseError(format!("missing {pointer}")))
}

fn classify_transport(err: reqwest::Error) -> LlmError {
    if err.is_timeout() {
        LlmError::Timeout
    } else {
        LlmError::HttpError(err)
    }
}
