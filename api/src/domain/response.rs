use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub type ResponseHeaders = BTreeMap<String, String>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    Timeout,
    Network,
    HttpClientError,
    Unknown,
}

/// Everything read off the wire for a call that produced an HTTP response.
#[derive(Clone, Debug, PartialEq)]
pub struct CompletedResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: ResponseHeaders,
    pub raw_body: String,
}

/// Transport-level reasons a call produced no usable response.
#[derive(Clone, Debug, PartialEq)]
pub enum DispatchError {
    Timeout,
    Connect(String),
    Client { message: String, status: Option<u16> },
    Other(String),
}

#[derive(Clone, Debug, PartialEq)]
pub enum DispatchOutcome {
    Completed(CompletedResponse),
    Failed(DispatchError),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum ExecutionResult {
    #[serde(rename_all = "camelCase")]
    Success {
        status: u16,
        status_text: String,
        headers: ResponseHeaders,
        raw_body: String,
        elapsed_ms: u64,
        size_bytes: u64,
    },
    #[serde(rename_all = "camelCase")]
    Failure {
        kind: FailureKind,
        message: String,
        elapsed_ms: u64,
        status: u16,
    },
}

impl ExecutionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionResult::Success { .. })
    }

    pub fn elapsed_ms(&self) -> u64 {
        match self {
            ExecutionResult::Success { elapsed_ms, .. } => *elapsed_ms,
            ExecutionResult::Failure { elapsed_ms, .. } => *elapsed_ms,
        }
    }

    /// HTTP status of the call, 0 when no response was obtained.
    pub fn status(&self) -> u16 {
        match self {
            ExecutionResult::Success { status, .. } => *status,
            ExecutionResult::Failure { status, .. } => *status,
        }
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            ExecutionResult::Success { .. } => None,
            ExecutionResult::Failure { kind, .. } => Some(*kind),
        }
    }
}

/// Shape handed to the browser after a test call.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<ResponseHeaders>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<ExecutionResult> for TestResponse {
    fn from(result: ExecutionResult) -> Self {
        match result {
            ExecutionResult::Success {
                status,
                status_text,
                headers,
                raw_body,
                elapsed_ms,
                size_bytes,
            } => TestResponse {
                success: true,
                status: Some(status),
                status_text: Some(status_text),
                headers: Some(headers),
                data: Some(raw_body),
                response_time: Some(elapsed_ms),
                size: Some(size_bytes),
                error: None,
            },
            ExecutionResult::Failure {
                message,
                elapsed_ms,
                status,
                ..
            } => TestResponse {
                success: false,
                status: Some(status),
                response_time: Some(elapsed_ms),
                error: Some(message),
                ..Default::default()
            },
        }
    }
}
