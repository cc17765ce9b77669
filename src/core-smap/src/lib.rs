//! Sitemap build-and-serve engine.
//!
//! A build harvests every publishable page and collection item per locale, links locale
//! variants of the same content to each other, serializes the result and publishes it to
//! the cache (or to files). The [`CacheGateway`] serves cached artifacts and triggers a
//! single-flight rebuild when the cache is cold.

pub mod collab;
pub mod common;
pub mod config;
pub mod context;
pub mod coordinator;
pub mod crosslink;
pub mod entry;
pub mod errors;
pub mod gateway;
pub mod harvest;
pub mod publish;
pub mod serialize;

pub use collab::{
    BuildLock, CacheRecord, CacheStore, ContentRepository, LocalBuildLock, LockHandle, MemoryCache,
    MemoryContentRepository,
};
pub use common::health::{health_check, health_router};
pub use common::hostname::{HostPortError, get_api_base_url};
pub use common::logging::{API_LOG_SETTINGS, TASK_LOG_SETTINGS, setup_logging};
pub use common::sitemap_env::{get_build_config, get_output_dir, is_truthy};
pub use common::tls_config::get_tls_config;
pub use config::{BuildConfig, BuildConfigBuilder, OutputFormat, OutputTarget};
pub use context::BuildContext;
pub use coordinator::{BUILD_LOCK_NAME, BuildCoordinator, BuildPhase, BuildReport};
pub use crosslink::cross_link;
pub use entry::{Alternate, ChangeFrequency, Document, Entry, LocaleMap, Record};
pub use errors::{Error, Result};
pub use gateway::{CONTENT_TYPE, CacheGateway, Served};
pub use harvest::harvest;
pub use publish::{Artifact, CACHE_NAMESPACE, INDEX_ARTIFACT, publish, render};
pub use serialize::serialize;
