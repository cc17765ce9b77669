pub mod health;
pub mod hostname;
pub mod logging;
pub mod sitemap_env;
pub mod tls_config;
