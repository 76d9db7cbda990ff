use base64::{engine::general_purpose::STANDARD, Engine};
use sqlx::{sqlite::SqliteRow, QueryBuilder, Row, Sqlite};
use tracing::{debug, info};
use uuid::Uuid;

use super::{now, parse_optional_timestamp, parse_timestamp, timestamp, ApiHubDb};
use crate::{
    domain::{
        api_key::{
            ApiKeyFilter, ApiKeySummary, ApiKeyUpdate, NewApiKey, MAX_ENVIRONMENT_LEN, MAX_NAME_LEN,
            MAX_SERVICE_LEN,
        },
        catalog::GroupCount,
    },
    error::{ApiHubError, Result},
};

const KEY_SELECT: &str = r#"
    SELECT id, name, service, environment, expires_at, last_used_at, created_at, updated_at
    FROM api_keys
    WHERE 1 = 1"#;

impl ApiHubDb {
    pub async fn list_api_keys(&self, filter: &ApiKeyFilter) -> Result<Vec<ApiKeySummary>> {
        let mut qb = QueryBuilder::<Sqlite>::new(KEY_SELECT);
        if let Some(service) = &filter.service {
            qb.push(" AND service = ").push_bind(service.clone());
        }
        if let Some(environment) = &filter.environment {
            qb.push(" AND environment = ").push_bind(environment.clone());
        }
        qb.push(" ORDER BY created_at DESC, id DESC");
        let keys = qb
            .build()
            .try_map(|row: SqliteRow| key_from_row(&row))
            .fetch_all(&self.pool)
            .await?;
        Ok(keys)
    }

    pub async fn get_api_key(&self, id: &str) -> Result<ApiKeySummary> {
        let mut qb = QueryBuilder::<Sqlite>::new(KEY_SELECT);
        qb.push(" AND id = ").push_bind(id.to_string());
        let key = qb
            .build()
            .try_map(|row: SqliteRow| key_from_row(&row))
            .fetch_optional(&self.pool)
            .await?;
        key.ok_or_else(|| ApiHubError::not_found(format!("api key {}", id)))
    }

    pub async fn create_api_key(&self, key: NewApiKey) -> Result<ApiKeySummary> {
        check_length("name", &key.name, 1, MAX_NAME_LEN)?;
        check_length("service", &key.service, 1, MAX_SERVICE_LEN)?;
        if key.key.is_empty() {
            return Err(ApiHubError::validation("key must not be empty"));
        }
        if let Some(environment) = &key.environment {
            check_length("environment", environment, 0, MAX_ENVIRONMENT_LEN)?;
        }

        let id = Uuid::new_v4().to_string();
        let created_at = now();
        info!("storing api key {} for service {}", id, key.service);
        sqlx::query(
            r#"
            INSERT INTO api_keys
                (id, name, service, encoded_key, environment, expires_at,
                 last_used_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, NULL, $7, $8)
            "#,
        )
        .bind(&id)
        .bind(&key.name)
        .bind(&key.service)
        .bind(STANDARD.encode(key.key.as_bytes()))
        .bind(&key.environment)
        .bind(key.expires_at.map(timestamp))
        .bind(&created_at)
        .bind(&created_at)
        .execute(&self.pool)
        .await?;
        self.get_api_key(&id).await
    }

    /// Changes only the fields that are set and bumps `updated_at`.
    pub async fn update_api_key(&self, id: &str, update: ApiKeyUpdate) -> Result<ApiKeySummary> {
        if let Some(name) = &update.name {
            check_length("name", name, 1, MAX_NAME_LEN)?;
        }
        if let Some(key) = &update.key {
            if key.is_empty() {
                return Err(ApiHubError::validation("key must not be empty"));
            }
        }
        if let Some(environment) = &update.environment {
            check_length("environment", environment, 0, MAX_ENVIRONMENT_LEN)?;
        }

        let mut qb = QueryBuilder::<Sqlite>::new("UPDATE api_keys SET updated_at = ");
        qb.push_bind(now());
        if let Some(name) = update.name {
            qb.push(", name = ").push_bind(name);
        }
        if let Some(key) = update.key {
            qb.push(", encoded_key = ").push_bind(STANDARD.encode(key.as_bytes()));
        }
        if let Some(environment) = update.environment {
            qb.push(", environment = ").push_bind(environment);
        }
        if let Some(expires_at) = update.expires_at {
            qb.push(", expires_at = ").push_bind(timestamp(expires_at));
        }
        qb.push(" WHERE id = ").push_bind(id.to_string());

        let result = qb.build().execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(ApiHubError::not_found(format!("api key {}", id)));
        }
        self.get_api_key(id).await
    }

    pub async fn delete_api_key(&self, id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM api_keys WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ApiHubError::not_found(format!("api key {}", id)));
        }
        Ok(())
    }

    /// Services with their stored key counts, most used first.
    pub async fn list_api_key_services(&self) -> Result<Vec<GroupCount>> {
        let services = sqlx::query(
            r#"
            SELECT service, COUNT(*) AS count
            FROM api_keys
            GROUP BY service
            ORDER BY count DESC, service ASC
            "#,
        )
        .try_map(|row: SqliteRow| {
            Ok(GroupCount {
                name: row.try_get("service")?,
                count: row.try_get("count")?,
            })
        })
        .fetch_all(&self.pool)
        .await?;
        Ok(services)
    }

    /// Returns the decoded secret and records the access time.
    pub async fn reveal_api_key(&self, id: &str) -> Result<String> {
        let encoded: Option<String> =
            sqlx::query_scalar("SELECT encoded_key FROM api_keys WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        let encoded = encoded.ok_or_else(|| ApiHubError::not_found(format!("api key {}", id)))?;

        sqlx::query("UPDATE api_keys SET last_used_at = $1 WHERE id = $2")
            .bind(now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        debug!("revealed api key {}", id);

        let bytes = STANDARD
            .decode(encoded.as_bytes())
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

fn check_length(field: &str, value: &str, min: usize, max: usize) -> Result<()> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(ApiHubError::validation(format!(
            "{} must be between {} and {} characters",
            field, min, max
        )));
    }
    Ok(())
}

fn key_from_row(row: &SqliteRow) -> std::result::Result<ApiKeySummary, sqlx::Error> {
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;
    Ok(ApiKeySummary {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        service: row.try_get("service")?,
        environment: row.try_get("environment")?,
        expires_at: parse_optional_timestamp(row.try_get("expires_at")?)?,
        last_used_at: parse_optional_timestamp(row.try_get("last_used_at")?)?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}
