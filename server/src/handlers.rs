use std::sync::Arc;

use apihub::domain::{
    api_key::{ApiKeyFilter, ApiKeySummary, ApiKeyUpdate, NewApiKey},
    catalog::{ApiDetail, ApiListQuery, ApiWithRating, GroupCount},
    history::{HistoryEntry, HistoryEntryInput, HistoryFilter},
    page::{Page, PageRequest},
    request::TestRequestInput,
    response::TestResponse,
    review::{NewReview, Review, ReviewSort, ReviewWithUser, VoteDirection},
};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::{error::AppResult, AppState};

type JsonBody<T> = Result<Json<T>, JsonRejection>;
type QueryParams<T> = Result<Query<T>, QueryRejection>;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryParams {
    pub user_id: Option<String>,
    pub limit: Option<i64>,
    pub cursor: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiListParams {
    pub category: Option<String>,
    pub auth_type: Option<String>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub cursor: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewListParams {
    pub limit: Option<i64>,
    pub cursor: Option<String>,
    #[serde(default)]
    pub sort_by: ReviewSort,
}

#[derive(Debug, Deserialize)]
pub struct VoteBody {
    pub direction: VoteDirection,
}

#[derive(Debug, Serialize)]
pub struct RevealedKey {
    pub key: String,
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Runs one test call. Dispatch failures are still a 200 with `success: false`.
pub async fn test_request(
    State(state): State<Arc<AppState>>,
    payload: JsonBody<TestRequestInput>,
) -> AppResult<Json<TestResponse>> {
    let Json(input) = payload?;
    let result = state.hub.test_request(input).await?;
    Ok(Json(TestResponse::from(result)))
}

pub async fn save_history(
    State(state): State<Arc<AppState>>,
    payload: JsonBody<HistoryEntryInput>,
) -> AppResult<(StatusCode, Json<HistoryEntry>)> {
    let Json(input) = payload?;
    let entry = state.hub.db.save_history(input).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn list_history(
    State(state): State<Arc<AppState>>,
    params: QueryParams<HistoryParams>,
) -> AppResult<Json<Page<HistoryEntry>>> {
    let Query(params) = params?;
    let filter = HistoryFilter {
        user_id: params.user_id,
    };
    let page = PageRequest {
        limit: params.limit,
        cursor: params.cursor,
    };
    Ok(Json(state.hub.db.list_history(&filter, &page).await?))
}

pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<HistoryEntry>> {
    Ok(Json(state.hub.db.get_history(&id).await?))
}

pub async fn list_apis(
    State(state): State<Arc<AppState>>,
    params: QueryParams<ApiListParams>,
) -> AppResult<Json<Page<ApiWithRating>>> {
    let Query(params) = params?;
    debug!("listing apis with {:?}", params);
    let query = ApiListQuery {
        category: params.category,
        auth_type: params.auth_type,
        search: params.search,
    };
    let page = PageRequest {
        limit: params.limit,
        cursor: params.cursor,
    };
    Ok(Json(state.hub.db.list_apis(&query, &page).await?))
}

pub async fn list_featured(
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<Vec<ApiWithRating>>> {
    Ok(Json(state.hub.db.list_featured().await?))
}

pub async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<Vec<GroupCount>>> {
    Ok(Json(state.hub.db.list_categories().await?))
}

pub async fn get_api(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiDetail>> {
    Ok(Json(state.hub.db.get_api(&id).await?))
}

pub async fn list_reviews(
    State(state): State<Arc<AppState>>,
    Path(api_id): Path<String>,
    params: QueryParams<ReviewListParams>,
) -> AppResult<Json<Page<ReviewWithUser>>> {
    let Query(params) = params?;
    let page = PageRequest {
        limit: params.limit,
        cursor: params.cursor,
    };
    Ok(Json(
        state
            .hub
            .db
            .list_reviews(&api_id, params.sort_by, &page)
            .await?,
    ))
}

pub async fn create_review(
    State(state): State<Arc<AppState>>,
    payload: JsonBody<NewReview>,
) -> AppResult<(StatusCode, Json<ReviewWithUser>)> {
    let Json(review) = payload?;
    let created = state.hub.db.create_review(review).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn vote_review(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: JsonBody<VoteBody>,
) -> AppResult<Json<Review>> {
    let Json(vote) = payload?;
    Ok(Json(state.hub.db.vote_review(&id, vote.direction).await?))
}

pub async fn list_api_keys(
    State(state): State<Arc<AppState>>,
    params: QueryParams<ApiKeyFilter>,
) -> AppResult<Json<Vec<ApiKeySummary>>> {
    let Query(filter) = params?;
    Ok(Json(state.hub.db.list_api_keys(&filter).await?))
}

pub async fn list_api_key_services(
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<Vec<GroupCount>>> {
    Ok(Json(state.hub.db.list_api_key_services().await?))
}

pub async fn create_api_key(
    State(state): State<Arc<AppState>>,
    payload: JsonBody<NewApiKey>,
) -> AppResult<(StatusCode, Json<ApiKeySummary>)> {
    let Json(key) = payload?;
    let created = state.hub.db.create_api_key(key).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_api_key(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiKeySummary>> {
    Ok(Json(state.hub.db.get_api_key(&id).await?))
}

pub async fn update_api_key(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: JsonBody<ApiKeyUpdate>,
) -> AppResult<Json<ApiKeySummary>> {
    let Json(update) = payload?;
    Ok(Json(state.hub.db.update_api_key(&id, update).await?))
}

pub async fn delete_api_key(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.hub.db.delete_api_key(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn reveal_api_key(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<RevealedKey>> {
    let key = state.hub.db.reveal_api_key(&id).await?;
    Ok(Json(RevealedKey { key }))
}
