//! In-process implementations of the collaborator interfaces.
//!
//! `MemoryCache` and `LocalBuildLock` are usable on a single-process deployment.
//! `MemoryContentRepository` is fixture-driven: it serves whatever documents it was
//! given and records each collection fetch, which makes it the repository of choice
//! for tests and for local dry runs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{OwnedMutexGuard, RwLock};
use tokio::time::Instant;
use uuid::Uuid;

use crate::collab::{BuildLock, CacheRecord, CacheStore, ContentRepository, LockHandle};
use crate::entry::Document;
use crate::errors::{Error, Result};

//
// Content repository
//

/// A recorded `list_items` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRequest {
    pub locale: String,
    pub type_name: String,
    pub offset: usize,
    pub limit: usize,
}

/// Content repository backed by in-memory fixtures.
#[derive(Default)]
pub struct MemoryContentRepository {
    locales: Vec<String>,
    pages: HashMap<String, Vec<Document>>,
    items: HashMap<(String, String), Vec<Document>>,
    collections: Vec<String>,
    should_fail: bool,
    item_requests: Mutex<Vec<ItemRequest>>,
}

impl MemoryContentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the locales reported by `active_locales`.
    pub fn with_locales(mut self, locales: &[&str]) -> Self {
        self.locales = locales.iter().map(|l| l.to_string()).collect();
        self
    }

    pub fn with_page(mut self, locale: &str, page: Document) -> Self {
        self.add_page(locale, page);
        self
    }

    pub fn with_item(mut self, locale: &str, item: Document) -> Self {
        self.add_item(locale, item);
        self
    }

    pub fn add_page(&mut self, locale: &str, page: Document) {
        self.pages.entry(locale.to_string()).or_default().push(page);
    }

    /// Adds a collection item, registering its collection on first sight.
    pub fn add_item(&mut self, locale: &str, item: Document) {
        self.register_collection(&item.type_name);
        self.items
            .entry((locale.to_string(), item.type_name.clone()))
            .or_default()
            .push(item);
    }

    pub fn register_collection(&mut self, type_name: &str) {
        if !self.collections.iter().any(|c| c == type_name) {
            self.collections.push(type_name.to_string());
        }
    }

    /// Makes every call fail with a repository read error.
    pub fn set_should_fail(&mut self, should_fail: bool) {
        self.should_fail = should_fail;
    }

    /// Every `list_items` call made so far, in order.
    pub fn item_requests(&self) -> Vec<ItemRequest> {
        self.item_requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn check(&self) -> Result<()> {
        if self.should_fail {
            Err(Error::RepositoryRead(
                "Memory content repository configured to fail".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ContentRepository for MemoryContentRepository {
    async fn active_locales(&self) -> Result<Vec<String>> {
        self.check()?;
        Ok(self.locales.clone())
    }

    async fn list_pages(&self, locale: &str) -> Result<Vec<Document>> {
        self.check()?;
        let mut pages = self.pages.get(locale).cloned().unwrap_or_default();
        pages.sort_by_key(|p| (p.level, p.rank));
        Ok(pages)
    }

    async fn collections(&self) -> Result<Vec<String>> {
        self.check()?;
        Ok(self.collections.clone())
    }

    async fn list_items(&self, locale: &str, type_name: &str, offset: usize, limit: usize) -> Result<Vec<Document>> {
        if let Ok(mut requests) = self.item_requests.lock() {
            requests.push(ItemRequest {
                locale: locale.to_string(),
                type_name: type_name.to_string(),
                offset,
                limit,
            });
        }
        self.check()?;
        let batch = self
            .items
            .get(&(locale.to_string(), type_name.to_string()))
            .map(|items| items.iter().skip(offset).take(limit).cloned().collect())
            .unwrap_or_default();
        Ok(batch)
    }
}

//
// Cache
//

struct CachedValue {
    record: CacheRecord,
    expires_at: Instant,
}

/// Namespaced in-process cache with per-key expiry.
#[derive(Default)]
pub struct MemoryCache {
    namespaces: RwLock<HashMap<String, HashMap<String, CachedValue>>>,
    fail_writes: AtomicBool,
    sets: AtomicUsize,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `set` and `clear` fail with a cache service error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful `set` calls so far.
    pub fn set_count(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }

    /// Keys currently held (expired or not) in a namespace, sorted.
    pub async fn keys(&self, namespace: &str) -> Vec<String> {
        let namespaces = self.namespaces.read().await;
        let mut keys: Vec<String> = namespaces
            .get(namespace)
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(Error::CacheService("Memory cache configured to fail writes".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<CacheRecord>> {
        let namespaces = self.namespaces.read().await;
        let record = namespaces
            .get(namespace)
            .and_then(|entries| entries.get(key))
            .filter(|value| value.expires_at > Instant::now())
            .map(|value| value.record.clone());
        Ok(record)
    }

    async fn set(&self, namespace: &str, key: &str, record: CacheRecord, ttl: Duration) -> Result<()> {
        self.check_writable()?;
        let mut namespaces = self.namespaces.write().await;
        namespaces.entry(namespace.to_string()).or_default().insert(
            key.to_string(),
            CachedValue {
                record,
                expires_at: Instant::now() + ttl,
            },
        );
        self.sets.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn clear(&self, namespace: &str) -> Result<()> {
        self.check_writable()?;
        self.namespaces.write().await.remove(namespace);
        Ok(())
    }
}

//
// Lock
//

/// Process-wide named locks built on tokio mutexes.
#[derive(Default)]
pub struct LocalBuildLock {
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
    held: Mutex<HashMap<Uuid, OwnedMutexGuard<()>>>,
    acquisitions: AtomicUsize,
}

impl LocalBuildLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful acquisitions so far.
    pub fn acquisitions(&self) -> usize {
        self.acquisitions.load(Ordering::SeqCst)
    }

    /// Number of handles currently held.
    pub fn held(&self) -> usize {
        self.held.lock().map(|h| h.len()).unwrap_or_default()
    }

    fn named(&self, name: &str) -> Result<Arc<tokio::sync::Mutex<()>>> {
        let mut locks = self
            .locks
            .lock()
            .map_err(|e| Error::Lock(format!("lock table poisoned: {}", e)))?;
        Ok(locks.entry(name.to_string()).or_default().clone())
    }
}

#[async_trait]
impl BuildLock for LocalBuildLock {
    async fn acquire(&self, name: &str) -> Result<LockHandle> {
        let mutex = self.named(name)?;
        let guard = mutex.lock_owned().await;
        let handle = LockHandle::new(name);
        self.held
            .lock()
            .map_err(|e| Error::Lock(format!("held-lock table poisoned: {}", e)))?
            .insert(handle.id, guard);
        self.acquisitions.fetch_add(1, Ordering::SeqCst);
        Ok(handle)
    }

    async fn release(&self, handle: LockHandle) -> Result<()> {
        let guard = self
            .held
            .lock()
            .map_err(|e| Error::Lock(format!("held-lock table poisoned: {}", e)))?
            .remove(&handle.id);
        match guard {
            Some(guard) => {
                drop(guard);
                Ok(())
            }
            None => Err(Error::Lock(format!("lock '{}' is not held by this handle", handle.name))),
        }
    }
}
