//! Interfaces to the services the sitemap engine depends on but does not own:
//! the content repository, the key/value cache and the distributed build lock.

pub mod memory;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::entry::Document;
use crate::errors::Result;

pub use memory::{LocalBuildLock, MemoryCache, MemoryContentRepository};

/// Read-only enumeration of publishable content.
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// Locales that should get a sitemap, already filtered to public, non-draft ones.
    async fn active_locales(&self) -> Result<Vec<String>>;

    /// All pages of a locale, sorted by tree depth then sibling rank.
    async fn list_pages(&self, locale: &str) -> Result<Vec<Document>>;

    /// Type tags of every content collection registered as sitemap-eligible.
    async fn collections(&self) -> Result<Vec<String>>;

    /// One page of a collection's items in a stable order.
    async fn list_items(&self, locale: &str, type_name: &str, offset: usize, limit: usize) -> Result<Vec<Document>>;
}

/// A cached artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheRecord {
    pub key: String,
    pub data: Vec<u8>,
    pub created_at: DateTime<Utc>,
}

/// Key/value cache with per-key time-to-live. The cache is authoritative for expiry.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<CacheRecord>>;

    async fn set(&self, namespace: &str, key: &str, record: CacheRecord, ttl: Duration) -> Result<()>;

    /// Drops every key in the namespace.
    async fn clear(&self, namespace: &str) -> Result<()>;
}

/// Proof of holding a named lock. Hand it back to [`BuildLock::release`].
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct LockHandle {
    pub id: Uuid,
    pub name: String,
}

impl LockHandle {
    pub fn new(name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
        }
    }
}

/// Named mutual exclusion. `acquire` waits for as long as another holder keeps the lock.
#[async_trait]
pub trait BuildLock: Send + Sync {
    async fn acquire(&self, name: &str) -> Result<LockHandle>;

    async fn release(&self, handle: LockHandle) -> Result<()>;
}
