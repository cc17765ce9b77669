//! Error types for sitemap building and serving.

use thiserror::Error;

/// Main error type for sitemap build and read operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The build configuration is unusable (e.g. per-locale output without a base URL).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The content repository failed while harvesting.
    #[error("Content repository read failed: {0}")]
    RepositoryRead(String),

    /// A cache service get/set/clear failed.
    #[error("Cache service error: {0}")]
    CacheService(String),

    /// The named build lock could not be acquired or released.
    #[error("Build lock error: {0}")]
    Lock(String),

    /// Writing an artifact to durable storage failed.
    #[error("Failed to write sitemap output: {0}")]
    Io(#[from] std::io::Error),

    /// The task running a build panicked or was aborted.
    #[error("Build task failed: {0}")]
    BuildTask(String),

    /// A rebuild finished but the cache still holds no sitemap artifacts.
    #[error("Sitemap cache is still empty after a rebuild")]
    CacheNotPopulated,
}

/// Type alias for Result with the sitemap Error.
pub type Result<T> = std::result::Result<T, Error>;
