use axum::{Router, middleware, routing::get};
use core_smap::{CacheGateway, health_router};
use tower_http::trace::TraceLayer;

pub mod logging_middleware;
pub mod sitemap;

//
// Router
//

pub fn router() -> Router<CacheGateway> {
    Router::new()
        .route("/sitemap.xml", get(sitemap::get_sitemap))
        .route("/sitemaps/{*path}", get(sitemap::get_sitemap_file))
        .merge(health_router::<CacheGateway>())
        // Custom route access logging
        .layer(middleware::from_fn(logging_middleware::log_route_access))
        // Tracing middleware
        .layer(TraceLayer::new_for_http())
}
