use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::deadpool::Pool;

pub type PoolError = deadpool::managed::PoolError<diesel_async::pooled_connection::PoolError>;

pub type DbPool = Pool<AsyncPgConnection>;

/// A connection checked out of the pool.
pub type PooledConnection = diesel_async::pooled_connection::deadpool::Object<AsyncPgConnection>;

#[derive(Debug, thiserror::Error)]
pub enum ConnectionPoolError {
    #[error("DATABASE_URL must be set in .env file or present as an env var")]
    MissingDatabaseUrl,
    #[error("Failed to build connection pool: {0}")]
    BuildError(#[from] deadpool::managed::BuildError),
    #[error("Failed to establish initial database connection: {0}")]
    ConnectionError(#[from] PoolError),
}

pub async fn establish_connection_pool(database_url: &str) -> Result<DbPool, ConnectionPoolError> {
    let config = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url);
    let pool = Pool::builder(config).build()?;

    // Force an initial connection to validate the database is reachable
    let _conn = pool.get().await?;

    Ok(pool)
}

/// Retrieves the value for the env var DATABASE_URL.
pub fn get_database_url() -> Result<String, ConnectionPoolError> {
    std::env::var("DATABASE_URL")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConnectionPoolError::MissingDatabaseUrl)
}

/// Uses the env var DATABASE_URL to establish a database connection pool.
pub async fn get_db_pool() -> Result<DbPool, ConnectionPoolError> {
    let database_url = get_database_url()?;
    let pool = establish_connection_pool(&database_url).await?;
    tracing::info!("Connected to database");
    Ok(pool)
}
