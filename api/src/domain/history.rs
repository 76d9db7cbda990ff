use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{catalog::ApiSummary, request::RequestHeaders};

/// Fields captured by an explicit "save to history" action.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntryInput {
    pub user_id: Option<String>,
    pub api_id: Option<String>,
    pub method: String,
    pub url: String,
    pub headers: Option<RequestHeaders>,
    pub body: Option<String>,
    pub response_status: Option<i64>,
    pub response_body: Option<String>,
    pub response_time: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub user_id: Option<String>,
    pub api_id: Option<String>,
    pub method: String,
    pub url: String,
    pub headers: Option<RequestHeaders>,
    pub body: Option<String>,
    pub response_status: Option<i64>,
    pub response_body: Option<String>,
    pub response_time: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub api: Option<ApiSummary>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryFilter {
    pub user_id: Option<String>,
}
