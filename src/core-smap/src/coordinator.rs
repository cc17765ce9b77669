//! Runs one complete sitemap build under the cluster-wide build lock.

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::try_join_all;

use crate::collab::{BuildLock, CacheStore, ContentRepository};
use crate::config::BuildConfig;
use crate::context::BuildContext;
use crate::crosslink::cross_link;
use crate::entry::LocaleMap;
use crate::errors::{Error, Result};
use crate::harvest::harvest;
use crate::publish::{Artifact, CACHE_NAMESPACE, publish};

/// Name of the lock serializing every build.
pub const BUILD_LOCK_NAME: &str = "sitemap build";

/// States of one build, logged as it progresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildPhase {
    Idle,
    LockAcquired,
    Harvested,
    CrossLinked,
    Published,
    Failed,
}

impl std::fmt::Display for BuildPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::LockAcquired => "lock acquired",
            Self::Harvested => "harvested",
            Self::CrossLinked => "cross-linked",
            Self::Published => "published",
            Self::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// Summary of a finished build.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub locales: Vec<String>,
    /// Number of harvested records across all locales.
    pub records: usize,
    pub artifacts: Vec<Artifact>,
}

/// Orchestrates harvest, cross-link and publish against the shared collaborators.
#[derive(Clone)]
pub struct BuildCoordinator {
    repository: Arc<dyn ContentRepository>,
    cache: Arc<dyn CacheStore>,
    lock: Arc<dyn BuildLock>,
}

impl BuildCoordinator {
    pub fn new(repository: Arc<dyn ContentRepository>, cache: Arc<dyn CacheStore>, lock: Arc<dyn BuildLock>) -> Self {
        Self {
            repository,
            cache,
            lock,
        }
    }

    pub fn cache(&self) -> &dyn CacheStore {
        self.cache.as_ref()
    }

    /// Runs a full build, waiting for any build already in progress to finish first.
    ///
    /// # Errors
    ///
    /// Configuration errors are raised before the lock is taken. Any later failure releases
    /// the lock and is returned unchanged.
    pub async fn build(&self, config: &BuildConfig) -> Result<BuildReport> {
        config.validate()?;
        let this = self.clone();
        let config = config.clone();
        detached(async move { this.with_lock(|| this.run(&config)).await }).await
    }

    /// Builds into the cache unless, once the lock is held, the cache already has its
    /// sentinel artifact. Concurrent callers therefore cause at most one build.
    ///
    /// Returns `None` when another build had already populated the cache.
    pub async fn ensure_built(&self, config: &BuildConfig) -> Result<Option<BuildReport>> {
        config.validate()?;
        let this = self.clone();
        let config = config.clone();
        detached(async move {
            this.with_lock(|| async {
                if this.is_populated(&config).await? {
                    tracing::debug!("[{}] Cache already populated by a concurrent build", BUILD_LOCK_NAME);
                    return Ok(None);
                }
                this.run(&config).await.map(Some)
            })
            .await
        })
        .await
    }

    /// Drops every cached artifact. The next read rebuilds.
    pub async fn clear_cache(&self) -> Result<()> {
        self.cache.clear(CACHE_NAMESPACE).await?;
        tracing::info!("Cleared sitemap cache namespace '{}'", CACHE_NAMESPACE);
        Ok(())
    }

    /// Runs `work` while holding the build lock, releasing it on every exit path.
    async fn with_lock<T, F, Fut>(&self, work: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let handle = self.lock.acquire(BUILD_LOCK_NAME).await?;
        tracing::debug!("[{}] {}", BUILD_LOCK_NAME, BuildPhase::LockAcquired);

        let outcome = work().await;

        let released = self.lock.release(handle).await;
        match (outcome, released) {
            (Ok(value), Ok(())) => {
                tracing::debug!("[{}] {}", BUILD_LOCK_NAME, BuildPhase::Idle);
                Ok(value)
            }
            (Ok(_), Err(e)) => {
                tracing::error!("[{}] Failed to release build lock: {}", BUILD_LOCK_NAME, e);
                Err(e)
            }
            (Err(e), released) => {
                tracing::error!("[{}] {}: {}", BUILD_LOCK_NAME, BuildPhase::Failed, e);
                if let Err(release_error) = released {
                    tracing::error!("[{}] Failed to release build lock: {}", BUILD_LOCK_NAME, release_error);
                }
                Err(e)
            }
        }
    }

    async fn is_populated(&self, config: &BuildConfig) -> Result<bool> {
        let sentinel = self.cache.get(CACHE_NAMESPACE, &config.sentinel_name()).await?;
        Ok(sentinel.is_some())
    }

    async fn run(&self, config: &BuildConfig) -> Result<BuildReport> {
        let context = BuildContext::new(config.clone());
        let locales = self.locales(config).await?;

        // each locale fills its own bucket, so harvests are independent
        let harvested = try_join_all(
            locales
                .iter()
                .map(|locale| harvest(self.repository.as_ref(), locale, &context)),
        )
        .await?;

        let mut map = LocaleMap::new();
        for (locale, records) in locales.iter().zip(harvested) {
            map.extend(locale, records);
        }
        let records = map.len();
        tracing::debug!("[{}] {} ({} records)", BUILD_LOCK_NAME, BuildPhase::Harvested, records);

        let map = cross_link(map);
        tracing::debug!("[{}] {}", BUILD_LOCK_NAME, BuildPhase::CrossLinked);

        let artifacts = publish(&map, &context, self.cache.as_ref()).await?;
        tracing::debug!("[{}] {}", BUILD_LOCK_NAME, BuildPhase::Published);

        tracing::info!(
            "Built sitemap for {} locale(s) with {} records into {} artifact(s)",
            locales.len(),
            records,
            artifacts.len()
        );
        Ok(BuildReport {
            locales,
            records,
            artifacts,
        })
    }

    async fn locales(&self, config: &BuildConfig) -> Result<Vec<String>> {
        if !config.localized {
            return Ok(vec![config.default_locale.clone()]);
        }
        let mut locales = self.repository.active_locales().await?;
        let mut seen = HashSet::new();
        locales.retain(|locale| seen.insert(locale.clone()));
        if locales.is_empty() {
            tracing::warn!(
                "No active locales found, building for the default locale '{}'",
                config.default_locale
            );
            locales.push(config.default_locale.clone());
        }
        Ok(locales)
    }
}

/// Runs a build on its own task. A caller that stops waiting, such as a dropped request,
/// leaves the build running through to the lock release.
async fn detached<T, Fut>(build: Fut) -> Result<T>
where
    T: Send + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    tokio::spawn(build)
        .await
        .map_err(|e| Error::BuildTask(e.to_string()))?
}
