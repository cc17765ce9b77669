use axum::{Router, http::StatusCode};

pub async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "healthy")
}

/// `GET /health`, mergeable into a router of any state.
pub fn health_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/health", axum::routing::get(health_check))
}
