pub mod api_keys;
pub mod catalog;
mod pagination;
pub mod repository;
pub mod reviews;
pub mod seed;

use chrono::{DateTime, SecondsFormat, Utc};

pub use repository::ApiHubDb;

/// Fixed-width RFC 3339 so that text ordering in SQLite matches time ordering.
pub(crate) fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn now() -> String {
    timestamp(Utc::now())
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, sqlx::Error> {
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

pub(crate) fn parse_optional_timestamp(
    raw: Option<String>,
) -> Result<Option<DateTime<Utc>>, sqlx::Error> {
    raw.as_deref().map(parse_timestamp).transpose()
}
