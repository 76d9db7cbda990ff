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
        page::{Page, PageRequest},
        review::{
            NewReview, Review, ReviewSort, ReviewWithUser, VoteDirection, MAX_RATING, MIN_RATING,
        },
        user::UserSummary,
    },
    error::{ApiHubError, Result},
};

pub const REVIEWS_DEFAULT_LIMIT: i64 = 10;
pub const REVIEWS_MAX_LIMIT: i64 = 50;

const REVIEW_SELECT: &str = r#"
    SELECT r.id, r.api_id, r.user_id, r.rating, r.content, r.helpful_count, r.created_at,
                  u.name AS user_name, u.avatar_url AS user_avatar_url
    FROM reviews r
    JOIN users u ON u.id = r.user_id
    WHERE 1 = 1"#;

fn keyset_for(sort: ReviewSort) -> Keyset {
    match sort {
        ReviewSort::Recent => Keyset::new("created_at", Direction::Desc),
        ReviewSort::Highest => Keyset::new("rating", Direction::Desc),
        ReviewSort::Lowest => Keyset::new("rating", Direction::Asc),
    }
}

impl ApiHubDb {
    pub async fn create_review(&self, review: NewReview) -> Result<ReviewWithUser> {
        if !(MIN_RATING..=MAX_RATING).contains(&review.rating) {
            return Err(ApiHubError::validation(format!(
                "rating must be between {} and {}, got {}",
                MIN_RATING, MAX_RATING, review.rating
            )));
        }
        let id = Uuid::new_v4().to_string();
        debug!("creating review {} for api {}", id, review.api_id);
        sqlx::query(
            r#"
            INSERT INTO reviews (id, api_id, user_id, rating, content, helpful_count, created_at)
            VALUES ($1, $2, $3, $4, $5, 0, $6)
            "#,
        )
        .bind(&id)
        .bind(&review.api_id)
        .bind(&review.user_id)
        .bind(review.rating)
        .bind(&review.content)
        .bind(now())
        .execute(&self.pool)
        .await?;
        self.get_review(&id).await
    }

    pub async fn get_review(&self, id: &str) -> Result<ReviewWithUser> {
        let mut qb = QueryBuilder::<Sqlite>::new(REVIEW_SELECT);
        qb.push(" AND r.id = ").push_bind(id.to_string());
        let review = qb
            .build()
            .try_map(|row: SqliteRow| review_with_user_from_row(&row))
            .fetch_optional(&self.pool)
            .await?;
        review.ok_or_else(|| ApiHubError::not_found(format!("review {}", id)))
    }

    pub async fn list_reviews(
        &self,
        api_id: &str,
        sort: ReviewSort,
        page: &PageRequest,
    ) -> Result<Page<ReviewWithUser>> {
        let limit = page.resolve_limit(REVIEWS_DEFAULT_LIMIT, REVIEWS_MAX_LIMIT)?;
        let mut qb = Keyset::begin(REVIEW_SELECT);
        qb.push(" AND r.api_id = ").push_bind(api_id.to_string());
        keyset_for(sort).finish(&mut qb, page.cursor.as_deref(), limit);

        let rows = qb
            .build()
            .try_map(|row: SqliteRow| review_with_user_from_row(&row))
            .fetch_all(&self.pool)
            .await?;
        Ok(Page::from_overfetch(rows, limit, |r| &r.review.id))
    }

    pub(crate) async fn recent_reviews(
        &self,
        api_id: &str,
        count: i64,
    ) -> Result<Vec<ReviewWithUser>> {
        let mut qb = QueryBuilder::<Sqlite>::new(REVIEW_SELECT);
        qb.push(" AND r.api_id = ")
            .push_bind(api_id.to_string())
            .push(" ORDER BY r.created_at DESC, r.id DESC LIMIT ")
            .push_bind(count);
        let reviews = qb
            .build()
            .try_map(|row: SqliteRow| review_with_user_from_row(&row))
            .fetch_all(&self.pool)
            .await?;
        Ok(reviews)
    }

    /// Moves helpful_count by one. No floor: it can go below zero.
    pub async fn vote_review(&self, id: &str, direction: VoteDirection) -> Result<Review> {
        let result =
            sqlx::query("UPDATE reviews SET helpful_count = helpful_count + $1 WHERE id = $2")
                .bind(direction.delta())
                .bind(id)
                .execute(&self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(ApiHubError::not_found(format!("review {}", id)));
        }
        Ok(self.get_review(id).await?.review)
    }
}

fn review_with_user_from_row(row: &SqliteRow) -> std::result::Result<ReviewWithUser, sqlx::Error> {
    let created_at: String = row.try_get("created_at")?;
    let review = Review {
        id: row.try_get("id")?,
        api_id: row.try_get("api_id")?,
        user_id: row.try_get("user_id")?,
        rating: row.try_get("rating")?,
        content: row.try_get("content")?,
        helpful_count: row.try_get("helpful_count")?,
        created_at: parse_timestamp(&created_at)?,
    };
    let user = UserSummary {
        id: review.user_id.clone(),
        name: row.try_get("user_name")?,
        avatar_url: row.try_get("user_avatar_url")?,
    };
    Ok(ReviewWithUser { review, user })
}
