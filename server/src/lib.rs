pub mod error;
pub mod handlers;
pub mod logging;

use std::sync::Arc;

use apihub::ApiHub;
use axum::{
    http::{header, Method},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub struct AppState {
    pub hub: ApiHub,
}

pub fn build_router(state: Arc<AppState>, enable_cors: bool) -> Router {
    let router = Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/test/request", post(handlers::test_request))
        .route(
            "/api/test/history",
            get(handlers::list_history).post(handlers::save_history),
        )
        .route("/api/test/history/{id}", get(handlers::get_history))
        .route("/api/apis", get(handlers::list_apis))
        .route("/api/apis/featured", get(handlers::list_featured))
        .route("/api/apis/categories", get(handlers::list_categories))
        .route("/api/apis/{id}", get(handlers::get_api))
        .route("/api/apis/{id}/reviews", get(handlers::list_reviews))
        .route("/api/reviews", post(handlers::create_review))
        .route("/api/reviews/{id}/vote", post(handlers::vote_review))
        .route(
            "/api/keys",
            get(handlers::list_api_keys).post(handlers::create_api_key),
        )
        .route("/api/keys/services", get(handlers::list_api_key_services))
        .route(
            "/api/keys/{id}",
            get(handlers::get_api_key)
                .patch(handlers::update_api_key)
                .delete(handlers::delete_api_key),
        )
        .route("/api/keys/{id}/reveal", post(handlers::reveal_api_key))
        .with_state(state);

    let mut router = router.layer(TraceLayer::new_for_http());
    if enable_cors {
        let cors = CorsLayer::new()
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PATCH,
                Method::DELETE,
            ])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            .allow_origin(Any);
        router = router.layer(cors);
    }
    router
}
