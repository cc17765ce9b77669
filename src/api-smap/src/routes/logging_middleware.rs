use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

/// Middleware that logs each route access with its result.
/// Sitemap requests on a cold cache include the rebuild in `duration_ms`.
pub async fn log_route_access(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    let duration_ms = start.elapsed().as_millis();
    let status = response.status().as_u16();

    if response.status().is_server_error() {
        tracing::error!(method = %method, path = %path, status = %status, duration_ms = %duration_ms);
    } else if response.status().is_client_error() {
        tracing::warn!(method = %method, path = %path, status = %status, duration_ms = %duration_ms);
    } else {
        tracing::info!(method = %method, path = %path, status = %status, duration_ms = %duration_ms);
    }

    response
}
