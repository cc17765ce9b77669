use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter for the web server.
pub const API_LOG_SETTINGS: &str = "api_smap=info,core_smap=info,data_model_smap=info,tower_http=info";

/// Default filter for the operational CLI.
pub const TASK_LOG_SETTINGS: &str = "sitemap_task=info,api_smap=info,core_smap=info,data_model_smap=warn";

/// Sets the logging (tracing) level using RUST_LOG, falling back to the supplied default log settings.
/// Logs go to stderr so a sitemap written to stdout stays clean.
pub fn setup_logging(default_log_settings: &str) {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| default_log_settings.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init()
}
