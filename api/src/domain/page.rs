use serde::{Deserialize, Serialize};

use crate::error::{ApiHubError, Result};

/// One slice of a cursor-paginated listing. `next_cursor` is the id of the
/// first row of the following page, absent on the last page.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    /// Builds a page from a `limit + 1` fetch. The overflow row is popped and
    /// becomes the cursor.
    pub fn from_overfetch(mut rows: Vec<T>, limit: usize, id_of: impl Fn(&T) -> &str) -> Self {
        let mut next_cursor = None;
        if rows.len() > limit {
            next_cursor = rows.pop().map(|next| id_of(&next).to_string());
            rows.truncate(limit);
        }
        Page {
            items: rows,
            next_cursor,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    pub limit: Option<i64>,
    pub cursor: Option<String>,
}

impl PageRequest {
    pub fn new(limit: i64) -> Self {
        PageRequest {
            limit: Some(limit),
            cursor: None,
        }
    }

    pub fn after(limit: i64, cursor: impl Into<String>) -> Self {
        PageRequest {
            limit: Some(limit),
            cursor: Some(cursor.into()),
        }
    }

    /// Applies the listing's default and rejects limits outside `1..=max`.
    pub fn resolve_limit(&self, default: i64, max: i64) -> Result<usize> {
        let limit = self.limit.unwrap_or(default);
        if !(1..=max).contains(&limit) {
            return Err(ApiHubError::validation(format!(
                "limit must be between 1 and {max}, got {limit}"
            )));
        }
        Ok(limit as usize)
    }
}
