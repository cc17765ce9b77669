use std::net::SocketAddr;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, thiserror::Error)]
pub enum HostPortError {
    #[error("Invalid port: {0}")]
    InvalidPort(#[from] std::num::ParseIntError),
    #[error("Invalid hostname: {0}")]
    InvalidHostname(#[from] std::net::AddrParseError),
}

/// Gets the host:port the sitemap server binds to from the env vars HOST and PORT.
/// Uses defaults `127.0.0.1:3000` if env vars are absent.
pub fn get_api_base_url() -> Result<SocketAddr, HostPortError> {
    socket_address(std::env::var("HOST").ok().as_deref(), std::env::var("PORT").ok().as_deref())
}

/// Parses a bind address from optional host and port strings.
pub fn socket_address(host: Option<&str>, port: Option<&str>) -> Result<SocketAddr, HostPortError> {
    let host = host.map(str::trim).filter(|h| !h.is_empty()).unwrap_or(DEFAULT_HOST);
    let port = match port.map(str::trim).filter(|p| !p.is_empty()) {
        Some(p) => p.parse::<u16>()?,
        None => DEFAULT_PORT,
    };
    Ok(format!("{}:{}", host, port).parse::<SocketAddr>()?)
}
