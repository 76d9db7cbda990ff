use std::str::FromStr;

use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    QueryBuilder, Row, Sqlite, SqlitePool,
};
use tracing::{debug, info};
use uuid::Uuid;

use super::{
    now, parse_timestamp,
    pagination::{Direction, Keyset},
};
use crate::{
    config::DatabaseConfig,
    domain::{
        catalog::ApiSummary,
        history::{HistoryEntry, HistoryEntryInput, HistoryFilter},
        page::{Page, PageRequest},
        request::RequestHeaders,
    },
    error::{ApiHubError, Result},
};

pub const HISTORY_DEFAULT_LIMIT: i64 = 20;
pub const HISTORY_MAX_LIMIT: i64 = 50;

const HISTORY_KEYSET: Keyset = Keyset::new("created_at", Direction::Desc);

const HISTORY_SELECT: &str = r#"
    SELECT h.id, h.user_id, h.api_id, h.method, h.url, h.headers, h.body,
                  h.response_status, h.response_body, h.response_time, h.created_at,
                  a.name AS api_name, a.category AS api_category
    FROM request_history h
    LEFT JOIN apis a ON a.id = h.api_id
    WHERE 1 = 1"#;

/// Handle on the SQLite store backing the catalog, reviews, history and keys.
/// Cheap to clone: clones share one pool.
#[derive(Clone, Debug)]
pub struct ApiHubDb {
    pub pool: SqlitePool,
}

impl ApiHubDb {
    /// Opens (creating if needed) the database at `config.url` and runs migrations.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        info!("acquiring sqlite pool for {}", config.url);
        let in_memory = config.url.contains(":memory:");
        let options = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .foreign_keys(true);

        // every connection to :memory: is a separate database, so pin to one
        let pool = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(config.max_connections)
                .connect_with(options)
                .await?
        };

        let db = ApiHubDb { pool };
        db.migrate().await?;
        info!("sqlite pool established");
        Ok(db)
    }

    pub async fn in_memory() -> Result<Self> {
        Self::connect(&DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
        })
        .await
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Appends one history row. Rows are never updated afterwards.
    pub async fn save_history(&self, input: HistoryEntryInput) -> Result<HistoryEntry> {
        debug!("saving history entry for {} {}", input.method, input.url);
        if input.method.trim().is_empty() || input.url.trim().is_empty() {
            return Err(ApiHubError::validation("history entries need a method and url"));
        }
        let id = Uuid::new_v4().to_string();
        let header_json = input
            .headers
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let mut transaction = self.pool.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO request_history
                (id, user_id, api_id, method, url, headers, body,
                  response_status, response_body, response_time, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(&id)
        .bind(&input.user_id)
        .bind(&input.api_id)
        .bind(&input.method)
        .bind(&input.url)
        .bind(&header_json)
        .bind(&input.body)
        .bind(input.response_status)
        .bind(&input.response_body)
        .bind(input.response_time)
        .bind(now())
        .execute(&mut *transaction)
        .await?;
        transaction.commit().await?;
        debug!("history entry {} committed", id);

        self.get_history(&id).await
    }

    pub async fn get_history(&self, id: &str) -> Result<HistoryEntry> {
        let mut qb = QueryBuilder::<Sqlite>::new(HISTORY_SELECT);
        qb.push(" AND h.id = ").push_bind(id.to_string());
        let entry = qb
            .build()
            .try_map(|row: SqliteRow| history_from_row(&row))
            .fetch_optional(&self.pool)
            .await?;
        entry.ok_or_else(|| ApiHubError::not_found(format!("history entry {}", id)))
    }

    /// Newest first, optionally narrowed to one user.
    pub async fn list_history(
        &self,
        filter: &HistoryFilter,
        page: &PageRequest,
    ) -> Result<Page<HistoryEntry>> {
        let limit = page.resolve_limit(HISTORY_DEFAULT_LIMIT, HISTORY_MAX_LIMIT)?;
        let mut qb = Keyset::begin(HISTORY_SELECT);
        if let Some(user_id) = &filter.user_id {
            qb.push(" AND h.user_id = ").push_bind(user_id.clone());
        }
        HISTORY_KEYSET.finish(&mut qb, page.cursor.as_deref(), limit);

        let rows = qb
            .build()
            .try_map(|row: SqliteRow| history_from_row(&row))
            .fetch_all(&self.pool)
            .await?;
        Ok(Page::from_overfetch(rows, limit, |h| &h.id))
    }
}

fn history_from_row(row: &SqliteRow) -> std::result::Result<HistoryEntry, sqlx::Error> {
    let raw_headers: Option<String> = row.try_get("headers")?;
    let headers = raw_headers
        .map(|raw| serde_json::from_str::<RequestHeaders>(&raw))
        .transpose()
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
    let api_id: Option<String> = row.try_get("api_id")?;
    let api_name: Option<String> = row.try_get("api_name")?;
    let api = match (&api_id, api_name) {
        (Some(id), Some(name)) => Some(ApiSummary {
            id: id.clone(),
            name,
            category: row.try_get("api_category")?,
        }),
        _ => None,
    };
    let created_at: String = row.try_get("created_at")?;

    Ok(HistoryEntry {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        api_id,
        method: row.try_get("method")?,
        url: row.try_get("url")?,
        headers,
        body: row.try_get("body")?,
        response_status: row.try_get("response_status")?,
        response_body: row.try_get("response_body")?,
        response_time: row.try_get("response_time")?,
        created_at: parse_timestamp(&created_at)?,
        api,
    })
}
