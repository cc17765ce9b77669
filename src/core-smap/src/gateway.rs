//! Read path for cached sitemap artifacts, rebuilding once on a cold cache.

use crate::config::{BuildConfig, OutputTarget};
use crate::coordinator::BuildCoordinator;
use crate::errors::{Error, Result};
use crate::publish::CACHE_NAMESPACE;

/// Content type of every artifact served by the gateway.
pub const CONTENT_TYPE: &str = "text/xml";

/// Outcome of a successful lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Served {
    Found(Vec<u8>),
    /// The cache is populated but holds nothing under the requested path.
    NotFound,
}

enum Lookup {
    Hit(Vec<u8>),
    Missing,
    Cold,
}

/// Serves cached artifacts by path.
#[derive(Clone)]
pub struct CacheGateway {
    coordinator: BuildCoordinator,
    config: BuildConfig,
}

impl CacheGateway {
    /// Creates a gateway rebuilding with `config`. Rebuilds always publish to the cache.
    pub fn new(coordinator: BuildCoordinator, mut config: BuildConfig) -> Self {
        config.target = OutputTarget::Cache;
        Self { coordinator, config }
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Looks up `path` (e.g. `sitemap.xml` or `/sitemaps/en.xml`).
    ///
    /// A miss on a populated cache is [`Served::NotFound`]. A miss on a cold cache triggers
    /// a single rebuild and one more lookup.
    ///
    /// # Errors
    ///
    /// Returns the failure of a lookup or of the rebuild, or [`Error::CacheNotPopulated`] when
    /// the cache is still cold after the rebuild.
    pub async fn serve(&self, path: &str) -> Result<Served> {
        let key = path.trim_start_matches('/');

        match self.lookup(key).await? {
            Lookup::Hit(data) => return Ok(Served::Found(data)),
            Lookup::Missing => return Ok(Served::NotFound),
            Lookup::Cold => {
                tracing::info!("Sitemap cache is cold while serving '{}', rebuilding", key);
                self.coordinator.ensure_built(&self.config).await?;
            }
        }

        match self.lookup(key).await? {
            Lookup::Hit(data) => Ok(Served::Found(data)),
            Lookup::Missing => Ok(Served::NotFound),
            Lookup::Cold => Err(Error::CacheNotPopulated),
        }
    }

    async fn lookup(&self, key: &str) -> Result<Lookup> {
        let cache = self.coordinator.cache();
        if let Some(record) = cache.get(CACHE_NAMESPACE, key).await? {
            return Ok(Lookup::Hit(record.data));
        }
        let sentinel = self.config.sentinel_name();
        if cache.get(CACHE_NAMESPACE, &sentinel).await?.is_some() {
            tracing::debug!("No cached sitemap '{}' while '{}' is present", key, sentinel);
            Ok(Lookup::Missing)
        } else {
            Ok(Lookup::Cold)
        }
    }
}
