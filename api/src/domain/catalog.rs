use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::review::ReviewWithUser;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiListing {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub base_url: String,
    pub category: Option<String>,
    pub auth_type: Option<String>,
    pub rate_limit: Option<String>,
    pub https: bool,
    pub cors: Option<String>,
    pub documentation_url: Option<String>,
    pub featured: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewApiListing {
    pub name: String,
    pub description: Option<String>,
    pub base_url: String,
    pub category: Option<String>,
    pub auth_type: Option<String>,
    pub rate_limit: Option<String>,
    #[serde(default)]
    pub https: bool,
    pub cors: Option<String>,
    pub documentation_url: Option<String>,
    #[serde(default)]
    pub featured: bool,
}

/// A listing with its rating aggregate, computed from review rows at query time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiWithRating {
    #[serde(flatten)]
    pub api: ApiListing,
    pub avg_rating: f64,
    pub review_count: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDetail {
    #[serde(flatten)]
    pub api: ApiWithRating,
    pub reviews: Vec<ReviewWithUser>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiSummary {
    pub id: String,
    pub name: String,
    pub category: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiListQuery {
    pub category: Option<String>,
    pub auth_type: Option<String>,
    pub search: Option<String>,
}

/// Name plus row count, used for category and key-service breakdowns.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupCount {
    pub name: String,
    pub count: i64,
}

/// Mean rating rounded to one decimal, 0 with no ratings.
pub fn average_rating(ratings: &[i64]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    let mean = ratings.iter().sum::<i64>() as f64 / ratings.len() as f64;
    (mean * 10.0).round() / 10.0
}
