use reqwest::header::HeaderMap;

use crate::domain::response::{
    CompletedResponse, DispatchError, DispatchOutcome, ExecutionResult, FailureKind,
    ResponseHeaders,
};

pub const TIMEOUT_MESSAGE: &str = "Request timed out";
pub const NETWORK_MESSAGE: &str = "Network error - check if the API is accessible";
pub const UNKNOWN_MESSAGE: &str = "Unknown error occurred";

/// Maps a dispatch outcome to the result shown to the user. Pure: no I/O,
/// no clock reads.
pub fn classify(outcome: DispatchOutcome, elapsed_ms: u64) -> ExecutionResult {
    match outcome {
        DispatchOutcome::Completed(response) => {
            let size_bytes = serialized_size(&response.raw_body);
            ExecutionResult::Success {
                status: response.status,
                status_text: response.status_text,
                headers: response.headers,
                raw_body: response.raw_body,
                elapsed_ms,
                size_bytes,
            }
        }
        DispatchOutcome::Failed(error) => {
            let (kind, message, status) = match error {
                DispatchError::Timeout => (FailureKind::Timeout, TIMEOUT_MESSAGE.to_string(), 0),
                DispatchError::Connect(_) => (FailureKind::Network, NETWORK_MESSAGE.to_string(), 0),
                DispatchError::Client { message, status } => {
                    (FailureKind::HttpClientError, message, status.unwrap_or(0))
                }
                DispatchError::Other(_) => (FailureKind::Unknown, UNKNOWN_MESSAGE.to_string(), 0),
            };
            ExecutionResult::Failure {
                kind,
                message,
                elapsed_ms,
                status,
            }
        }
    }
}

/// Sorts a reqwest error into the dispatch taxonomy.
pub fn dispatch_error(err: &reqwest::Error) -> DispatchError {
    if err.is_timeout() {
        DispatchError::Timeout
    } else if err.is_connect() {
        DispatchError::Connect(err.to_string())
    } else if err.is_builder()
        || err.is_request()
        || err.is_redirect()
        || err.is_status()
        || err.is_body()
        || err.is_decode()
    {
        DispatchError::Client {
            message: err.to_string(),
            status: err.status().map(|s| s.as_u16()),
        }
    } else {
        DispatchError::Other(err.to_string())
    }
}

/// Byte length of the body once serialized as a JSON string, which is the
/// form the client receives it in.
pub fn serialized_size(raw_body: &str) -> u64 {
    serde_json::to_string(raw_body)
        .map(|s| s.len() as u64)
        .unwrap_or(raw_body.len() as u64)
}

/// Flattens a header map, joining repeated names with ", ".
pub fn collect_headers(headers: &HeaderMap) -> ResponseHeaders {
    let mut collected = ResponseHeaders::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        collected
            .entry(name.as_str().to_string())
            .and_modify(|existing: &mut String| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    collected
}

pub fn completed(
    status: reqwest::StatusCode,
    headers: &HeaderMap,
    body: &[u8],
) -> CompletedResponse {
    CompletedResponse {
        status: status.as_u16(),
        status_text: status.canonical_reason().unwrap_or_default().to_string(),
        headers: collect_headers(headers),
        raw_body: String::from_utf8_lossy(body).into_owned(),
    }
}
