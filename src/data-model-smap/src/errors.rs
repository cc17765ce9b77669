use crate::db::PoolError;

/// Failure talking to Postgres.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Database connection pool error: {0}")]
    Pool(#[from] PoolError),
    #[error("Database query failed: {0}")]
    Query(#[from] diesel::result::Error),
    #[error("{0}")]
    Invalid(String),
}

impl DbError {
    /// As a failure of the content repository.
    pub fn into_read(self) -> core_smap::Error {
        core_smap::Error::RepositoryRead(self.to_string())
    }

    /// As a failure of the cache service.
    pub fn into_cache(self) -> core_smap::Error {
        core_smap::Error::CacheService(self.to_string())
    }

    /// As a failure of the lock service.
    pub fn into_lock(self) -> core_smap::Error {
        core_smap::Error::Lock(self.to_string())
    }
}
