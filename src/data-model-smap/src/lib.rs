pub mod cache;
pub mod db;
pub mod errors;
pub mod lock;
pub mod models;
pub mod repository;
pub mod schema;

// Make test_helpers available for tests in this crate and dependent crates
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use cache::PgCacheStore;
pub use db::{DbPool, establish_connection_pool, get_database_url, get_db_pool};
pub use errors::DbError;
pub use lock::PgAdvisoryLock;
pub use repository::PgContentRepository;
