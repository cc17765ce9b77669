use std::env;
use std::path::PathBuf;

use axum_server::tls_rustls::RustlsConfig;

use crate::errors::{Error, Result};

/// Loads TLS configuration when both TLS_CERT_PATH and TLS_KEY_PATH are set.
///
/// Returns `None` when neither is set, meaning the server speaks plain HTTP.
/// Setting only one of them, or pointing at missing files, is a configuration error.
pub async fn get_tls_config() -> Result<Option<RustlsConfig>> {
    let cert = env::var("TLS_CERT_PATH").ok().filter(|v| !v.trim().is_empty());
    let key = env::var("TLS_KEY_PATH").ok().filter(|v| !v.trim().is_empty());

    let (cert_path, key_path) = match (cert, key) {
        (None, None) => return Ok(None),
        (Some(cert), Some(key)) => (PathBuf::from(cert), PathBuf::from(key)),
        _ => {
            return Err(Error::Configuration(
                "TLS_CERT_PATH and TLS_KEY_PATH must be set together".to_string(),
            ));
        }
    };

    for (what, path) in [("Certificate", &cert_path), ("Private key", &key_path)] {
        if !path.exists() {
            return Err(Error::Configuration(format!(
                "{} file does not exist: {}",
                what,
                path.display()
            )));
        }
    }

    // a provider may already be installed by another component
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let config = RustlsConfig::from_pem_file(cert_path, key_path).await.map_err(|e| {
        Error::Configuration(format!("Failed to load TLS certificate and key: {}", e))
    })?;
    Ok(Some(config))
}
