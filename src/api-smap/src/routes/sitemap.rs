use axum::{
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use core_smap::{CONTENT_TYPE, CacheGateway, Served};

/// Failure of a sitemap request. Details are logged, never returned.
#[derive(Debug, thiserror::Error)]
pub enum SitemapError {
    #[error("sitemap not found")]
    NotFound,
    #[error(transparent)]
    Internal(#[from] core_smap::Error),
}

impl IntoResponse for SitemapError {
    fn into_response(self) -> Response {
        match self {
            SitemapError::NotFound => (StatusCode::NOT_FOUND, "not found").into_response(),
            SitemapError::Internal(e) => {
                tracing::error!("Failed to serve sitemap: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "error").into_response()
            }
        }
    }
}

/// GET /sitemap.xml - The single combined sitemap
pub async fn get_sitemap(State(gateway): State<CacheGateway>) -> Result<Response, SitemapError> {
    serve(&gateway, "sitemap.xml").await
}

/// GET /sitemaps/{*path} - A per-locale sitemap or the sitemap index
pub async fn get_sitemap_file(
    State(gateway): State<CacheGateway>,
    Path(path): Path<String>,
) -> Result<Response, SitemapError> {
    serve(&gateway, &format!("sitemaps/{}", path)).await
}

async fn serve(gateway: &CacheGateway, path: &str) -> Result<Response, SitemapError> {
    match gateway.serve(path).await? {
        Served::Found(data) => Ok(([(header::CONTENT_TYPE, CONTENT_TYPE)], data).into_response()),
        Served::NotFound => {
            tracing::debug!("No sitemap at '{}'", path);
            Err(SitemapError::NotFound)
        }
    }
}
