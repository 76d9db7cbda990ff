use std::collections::HashMap;

use sqlx::{sqlite::SqliteRow, QueryBuilder, Row, Sqlite};
use tracing::debug;
use uuid::Uuid;

use super::{
    now, parse_timestamp,
    pagination::{Direction, Keyset},
    ApiHubDb,
};
use crate::{
    domain::{
        catalog::{
            average_rating, ApiDetail, ApiListQuery, ApiListing, ApiWithRating, GroupCount,
            NewApiListing,
        },
        page::{Page, PageRequest},
        user::{NewUser, User},
    },
    error::{ApiHubError, Result},
};

pub const APIS_DEFAULT_LIMIT: i64 = 20;
pub const APIS_MAX_LIMIT: i64 = 100;
pub const FEATURED_LIMIT: i64 = 6;
pub const DETAIL_REVIEW_LIMIT: i64 = 10;

const API_KEYSET: Keyset = Keyset::new("created_at", Direction::Desc);

const API_SELECT: &str = r#"
    SELECT a.id, a.name, a.description, a.base_url, a.category, a.auth_type,
                  a.rate_limit, a.https, a.cors, a.documentation_url, a.featured, a.created_at
    FROM apis a
    WHERE 1 = 1"#;

impl ApiHubDb {
    pub async fn create_user(&self, user: NewUser) -> Result<User> {
        if user.email.trim().is_empty() {
            return Err(ApiHubError::validation("user email is required"));
        }
        let id = Uuid::new_v4().to_string();
        sqlx::query(
            r#"
            INSERT INTO users (id, email, name, avatar_url, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.avatar_url)
        .bind(now())
        .execute(&self.pool)
        .await?;
        self.get_user(&id).await
    }

    pub async fn get_user(&self, id: &str) -> Result<User> {
        sqlx::query("SELECT id, email, name, avatar_url, created_at FROM users WHERE id = $1")
            .bind(id)
            .try_map(|row: SqliteRow| {
                let created_at: String = row.try_get("created_at")?;
                Ok(User {
                    id: row.try_get("id")?,
                    email: row.try_get("email")?,
                    name: row.try_get("name")?,
                    avatar_url: row.try_get("avatar_url")?,
                    created_at: parse_timestamp(&created_at)?,
                })
            })
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ApiHubError::not_found(format!("user {}", id)))
    }

    pub async fn create_api(&self, api: NewApiListing) -> Result<ApiListing> {
        if api.name.trim().is_empty() || api.base_url.trim().is_empty() {
            return Err(ApiHubError::validation("api listings need a name and base url"));
        }
        let id = Uuid::new_v4().to_string();
        debug!("creating api listing {} ({})", api.name, id);
        sqlx::query(
            r#"
            INSERT INTO apis
                (id, name, description, base_url, category, auth_type, rate_limit,
                  https, cors, documentation_url, featured, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(&id)
        .bind(&api.name)
        .bind(&api.description)
        .bind(&api.base_url)
        .bind(&api.category)
        .bind(&api.auth_type)
        .bind(&api.rate_limit)
        .bind(api.https)
        .bind(&api.cors)
        .bind(&api.documentation_url)
        .bind(api.featured)
        .bind(now())
        .execute(&self.pool)
        .await?;
        self.get_listing(&id).await
    }

    /// Removes a listing and its reviews. History rows keep their data but
    /// lose the link.
    pub async fn delete_api(&self, id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM apis WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ApiHubError::not_found(format!("api {}", id)));
        }
        Ok(())
    }

    /// Newest first. `search` matches name or description, ignoring case.
    pub async fn list_apis(
        &self,
        query: &ApiListQuery,
        page: &PageRequest,
    ) -> Result<Page<ApiWithRating>> {
        let limit = page.resolve_limit(APIS_DEFAULT_LIMIT, APIS_MAX_LIMIT)?;
        let mut qb = Keyset::begin(API_SELECT);
        if let Some(category) = non_blank(&query.category) {
            qb.push(" AND a.category = ").push_bind(category.to_string());
        }
        if let Some(auth_type) = non_blank(&query.auth_type) {
            qb.push(" AND a.auth_type = ").push_bind(auth_type.to_string());
        }
        if let Some(search) = non_blank(&query.search) {
            let needle = search.to_lowercase();
            qb.push(" AND (instr(lower(a.name), ")
                .push_bind(needle.clone())
                .push(") > 0 OR instr(lower(coalesce(a.description, '')), ")
                .push_bind(needle)
                .push(") > 0)");
        }
        API_KEYSET.finish(&mut qb, page.cursor.as_deref(), limit);

        let rows = qb
            .build()
            .try_map(|row: SqliteRow| api_from_row(&row))
            .fetch_all(&self.pool)
            .await?;
        let page = Page::from_overfetch(rows, limit, |a| &a.id);
        Ok(Page {
            items: self.with_ratings(page.items).await?,
            next_cursor: page.next_cursor,
        })
    }

    /// The listing, its rating aggregate over all reviews, and its most recent reviews.
    pub async fn get_api(&self, id: &str) -> Result<ApiDetail> {
        let listing = self.get_listing(id).await?;
        let ratings: Vec<i64> = sqlx::query_scalar("SELECT rating FROM reviews WHERE api_id = $1")
            .bind(id)
            .fetch_all(&self.pool)
            .await?;
        let reviews = self.recent_reviews(id, DETAIL_REVIEW_LIMIT).await?;

        Ok(ApiDetail {
            api: ApiWithRating {
                api: listing,
                avg_rating: average_rating(&ratings),
                review_count: ratings.len() as i64,
            },
            reviews,
        })
    }

    /// Category names with listing counts, most populated first.
    pub async fn list_categories(&self) -> Result<Vec<GroupCount>> {
        let categories = sqlx::query(
            r#"
            SELECT category, COUNT(*) AS count
            FROM apis
            WHERE category IS NOT NULL AND category != ''
            GROUP BY category
            ORDER BY count DESC, category ASC
            "#,
        )
        .try_map(|row: SqliteRow| {
            Ok(GroupCount {
                name: row.try_get("category")?,
                count: row.try_get("count")?,
            })
        })
        .fetch_all(&self.pool)
        .await?;
        Ok(categories)
    }

    pub async fn list_featured(&self) -> Result<Vec<ApiWithRating>> {
        let mut qb = QueryBuilder::<Sqlite>::new(API_SELECT);
        qb.push(" AND a.featured = 1 ORDER BY a.created_at DESC, a.id DESC LIMIT ")
            .push_bind(FEATURED_LIMIT);
        let rows = qb
            .build()
            .try_map(|row: SqliteRow| api_from_row(&row))
            .fetch_all(&self.pool)
            .await?;
        self.with_ratings(rows).await
    }

    pub(crate) async fn get_listing(&self, id: &str) -> Result<ApiListing> {
        let mut qb = QueryBuilder::<Sqlite>::new(API_SELECT);
        qb.push(" AND a.id = ").push_bind(id.to_string());
        let listing = qb
            .build()
            .try_map(|row: SqliteRow| api_from_row(&row))
            .fetch_optional(&self.pool)
            .await?;
        listing.ok_or_else(|| ApiHubError::not_found(format!("api {}", id)))
    }

    /// Attaches rating aggregates with one query for the whole batch.
    async fn with_ratings(&self, listings: Vec<ApiListing>) -> Result<Vec<ApiWithRating>> {
        if listings.is_empty() {
            return Ok(Vec::new());
        }
        let mut qb =
            QueryBuilder::<Sqlite>::new("SELECT api_id, rating FROM reviews WHERE api_id IN (");
        let mut ids = qb.separated(", ");
        for listing in &listings {
            ids.push_bind(listing.id.clone());
        }
        ids.push_unseparated(")");

        let rows: Vec<(String, i64)> = qb.build_query_as().fetch_all(&self.pool).await?;
        let mut ratings: HashMap<String, Vec<i64>> = HashMap::new();
        for (api_id, rating) in rows {
            ratings.entry(api_id).or_default().push(rating);
        }

        Ok(
            listings
                .into_iter()
                .map(|api| {
                    let api_ratings = ratings.remove(&api.id).unwrap_or_default();
                    ApiWithRating {
                        avg_rating: average_rating(&api_ratings),
                        review_count: api_ratings.len() as i64,
                        api,
                    }
                })
                .collect(),
        )
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn api_from_row(row: &SqliteRow) -> std::result::Result<ApiListing, sqlx::Error> {
    let created_at: String = row.try_get("created_at")?;
    Ok(ApiListing {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        base_url: row.try_get("base_url")?,
        category: row.try_get("category")?,
        auth_type: row.try_get("auth_type")?,
        rate_limit: row.try_get("rate_limit")?,
        https: row.try_get("https")?,
        cors: row.try_get("cors")?,
        documentation_url: row.try_get("documentation_url")?,
        featured: row.try_get("featured")?,
        created_at: parse_timestamp(&created_at)?,
    })
}
