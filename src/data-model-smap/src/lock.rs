//! Cluster-wide build lock on Postgres session-level advisory locks.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use diesel::sql_types::BigInt;
use diesel_async::RunQueryDsl;
use sha2::{Digest, Sha256};
use tokio::sync::OwnedMutexGuard;
use uuid::Uuid;

use core_smap::{BuildLock, LockHandle, Result};

use crate::db::{DbPool, PooledConnection};
use crate::errors::DbError;

/// Advisory lock key derived from a lock name.
pub fn lock_key(name: &str) -> i64 {
    let digest = Sha256::digest(name.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    i64::from_be_bytes(bytes)
}

/// A held advisory lock: the session that took it and this process's gate for the name.
struct Held {
    conn: PooledConnection,
    _gate: OwnedMutexGuard<()>,
}

/// Named lock shared by every process connected to the same database.
///
/// The lock lives on the connection that took it, so that connection is kept out of the
/// pool until release. If the process dies, Postgres drops the lock with the session.
///
/// Within one process, callers first queue on an in-memory gate per lock name. At most one
/// of them at a time holds a pooled connection while waiting on Postgres, leaving the rest
/// of the pool to the build that holds the lock.
pub struct PgAdvisoryLock {
    pool: DbPool,
    gates: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
    held: Mutex<HashMap<Uuid, Held>>,
}

impl PgAdvisoryLock {
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            gates: Mutex::new(HashMap::new()),
            held: Mutex::new(HashMap::new()),
        }
    }

    fn gate(&self, name: &str) -> Result<Arc<tokio::sync::Mutex<()>>> {
        let mut gates = self
            .gates
            .lock()
            .map_err(|e| core_smap::Error::Lock(format!("lock gate table poisoned: {}", e)))?;
        Ok(gates.entry(name.to_string()).or_default().clone())
    }

    async fn lock(&self, name: &str) -> std::result::Result<PooledConnection, DbError> {
        let mut conn = self.pool.get().await?;
        diesel::sql_query("SELECT pg_advisory_lock($1)")
            .bind::<BigInt, _>(lock_key(name))
            .execute(&mut conn)
            .await?;
        Ok(conn)
    }

    async fn unlock(conn: &mut PooledConnection, name: &str) -> std::result::Result<(), DbError> {
        diesel::sql_query("SELECT pg_advisory_unlock($1)")
            .bind::<BigInt, _>(lock_key(name))
            .execute(conn)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl BuildLock for PgAdvisoryLock {
    async fn acquire(&self, name: &str) -> Result<LockHandle> {
        let gate = self.gate(name)?.lock_owned().await;
        tracing::debug!("Waiting for advisory lock '{}'", name);
        let conn = self.lock(name).await.map_err(DbError::into_lock)?;

        let handle = LockHandle::new(name);
        self.held
            .lock()
            .map_err(|e| core_smap::Error::Lock(format!("held-lock table poisoned: {}", e)))?
            .insert(handle.id, Held { conn, _gate: gate });
        Ok(handle)
    }

    async fn release(&self, handle: LockHandle) -> Result<()> {
        let held = self
            .held
            .lock()
            .map_err(|e| core_smap::Error::Lock(format!("held-lock table poisoned: {}", e)))?
            .remove(&handle.id);
        let Some(mut held) = held else {
            return Err(core_smap::Error::Lock(format!(
                "lock '{}' is not held by this handle",
                handle.name
            )));
        };

        // the gate opens only after Postgres has let go
        if let Err(e) = Self::unlock(&mut held.conn, &handle.name).await {
            // closing the session drops the lock
            drop(PooledConnection::take(held.conn));
            return Err(e.into_lock());
        }
        Ok(())
    }
}
