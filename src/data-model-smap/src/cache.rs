//! Sitemap cache in the `sitemap_cache` table.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;

use core_smap::{CacheRecord, CacheStore, Result};

use crate::db::DbPool;
use crate::errors::DbError;
use crate::models::CacheEntry;
use crate::schema::sitemap_cache;

/// Cache shared by every server process using the same database.
/// Expired rows are invisible to `get` and overwritten by the next `set`.
#[derive(Clone)]
pub struct PgCacheStore {
    pool: DbPool,
}

impl PgCacheStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn load(&self, namespace: &str, key: &str) -> std::result::Result<Option<CacheEntry>, DbError> {
        let mut conn = self.pool.get().await?;
        let entry = sitemap_cache::table
            .filter(sitemap_cache::namespace.eq(namespace))
            .filter(sitemap_cache::key.eq(key))
            .filter(sitemap_cache::expires_at.gt(Utc::now()))
            .select(CacheEntry::as_select())
            .first::<CacheEntry>(&mut conn)
            .await
            .optional()?;
        Ok(entry)
    }

    async fn store(&self, entry: CacheEntry) -> std::result::Result<(), DbError> {
        let mut conn = self.pool.get().await?;
        diesel::insert_into(sitemap_cache::table)
            .values(&entry)
            .on_conflict((sitemap_cache::namespace, sitemap_cache::key))
            .do_update()
            .set((
                sitemap_cache::data.eq(excluded(sitemap_cache::data)),
                sitemap_cache::created_at.eq(excluded(sitemap_cache::created_at)),
                sitemap_cache::expires_at.eq(excluded(sitemap_cache::expires_at)),
            ))
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    async fn delete_namespace(&self, namespace: &str) -> std::result::Result<usize, DbError> {
        let mut conn = self.pool.get().await?;
        let deleted = diesel::delete(sitemap_cache::table.filter(sitemap_cache::namespace.eq(namespace)))
            .execute(&mut conn)
            .await?;
        Ok(deleted)
    }
}

#[async_trait]
impl CacheStore for PgCacheStore {
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<CacheRecord>> {
        let entry = self.load(namespace, key).await.map_err(DbError::into_cache)?;
        Ok(entry.map(CacheRecord::from))
    }

    async fn set(&self, namespace: &str, key: &str, record: CacheRecord, ttl: Duration) -> Result<()> {
        let ttl = TimeDelta::from_std(ttl)
            .map_err(|e| DbError::Invalid(format!("cache lifetime out of range: {}", e)).into_cache())?;
        let entry = CacheEntry {
            namespace: namespace.to_string(),
            key: key.to_string(),
            data: record.data,
            created_at: record.created_at,
            expires_at: Utc::now() + ttl,
        };
        self.store(entry).await.map_err(DbError::into_cache)
    }

    async fn clear(&self, namespace: &str) -> Result<()> {
        let deleted = self.delete_namespace(namespace).await.map_err(DbError::into_cache)?;
        tracing::debug!("Deleted {} cached entries from '{}'", deleted, namespace);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;

    fn record(key: &str, data: &str) -> CacheRecord {
        CacheRecord {
            key: key.to_string(),
            data: data.as_bytes().to_vec(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    #[ignore = "needs a Postgres database at TEST_DATABASE_URL"]
    async fn test_set_get_overwrite_and_clear() {
        let pool = test_db_pool().await;
        let _guard = TEST_DB_MUTEX.lock().await;
        clean_test_db(&pool).await;
        let cache = PgCacheStore::new(pool);
        let ttl = Duration::from_secs(60);

        cache.set("sitemap", "sitemap.xml", record("sitemap.xml", "one"), ttl).await.unwrap();
        cache.set("sitemap", "sitemap.xml", record("sitemap.xml", "two"), ttl).await.unwrap();
        cache.set("other", "sitemap.xml", record("sitemap.xml", "other"), ttl).await.unwrap();

        let cached = cache.get("sitemap", "sitemap.xml").await.unwrap().unwrap();
        assert_eq!(cached.data, b"two");

        cache.clear("sitemap").await.unwrap();
        assert!(cache.get("sitemap", "sitemap.xml").await.unwrap().is_none());
        assert!(cache.get("other", "sitemap.xml").await.unwrap().is_some());
    }

    #[tokio::test]
    #[ignore = "needs a Postgres database at TEST_DATABASE_URL"]
    async fn test_expired_entries_are_invisible() {
        let pool = test_db_pool().await;
        let _guard = TEST_DB_MUTEX.lock().await;
        clean_test_db(&pool).await;
        let cache = PgCacheStore::new(pool);

        cache
            .set("sitemap", "sitemap.xml", record("sitemap.xml", "stale"), Duration::ZERO)
            .await
            .unwrap();
        assert!(cache.get("sitemap", "sitemap.xml").await.unwrap().is_none());
    }
}
