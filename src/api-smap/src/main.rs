use std::sync::Arc;

use core_smap::{
    API_LOG_SETTINGS, BuildCoordinator, CacheGateway, get_api_base_url, get_build_config, get_tls_config,
    setup_logging,
};
use data_model_smap::{PgAdvisoryLock, PgCacheStore, PgContentRepository, get_db_pool};

use api_smap::routes;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    setup_logging(API_LOG_SETTINGS);

    let config = get_build_config()?;
    // fail at startup rather than on the first cold-cache request
    config.validate()?;

    let pool = get_db_pool().await?;
    let coordinator = BuildCoordinator::new(
        Arc::new(PgContentRepository::new(pool.clone())),
        Arc::new(PgCacheStore::new(pool.clone())),
        Arc::new(PgAdvisoryLock::new(pool)),
    );
    let app = routes::router().with_state(CacheGateway::new(coordinator, config));

    let addr = get_api_base_url()?;
    match get_tls_config().await? {
        Some(tls) => {
            tracing::info!("Serving sitemaps on https://{}", addr);
            axum_server::bind_rustls(addr, tls)
                .serve(app.into_make_service())
                .await?;
        }
        None => {
            tracing::info!("Serving sitemaps on http://{}", addr);
            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app).await?;
        }
    }
    Ok(())
}
