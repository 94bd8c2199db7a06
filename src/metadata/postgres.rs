//! Postgres-backed photo metadata store.
//!
//! Connections come from a `deadpool-postgres` pool built once at startup
//! and shared by every invocation of the process.  The pool opens its
//! single connection lazily, drops it once it has been idle for longer than
//! the configured idle timeout, and verifies it before reuse so a dead
//! connection is replaced on the next checkout.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use anyhow::Context;
use deadpool_postgres::{
    Config, ManagerConfig, Pool, PoolConfig, RecyclingMethod, Runtime, Timeouts,
};
use tokio_postgres::types::ToSql;
use tokio_postgres::NoTls;
use tracing::debug;

use super::store::{PhotoKey, PhotoMetadataStore};
use crate::config::DatabaseConfig;

const DELETE_PHOTO_SQL: &str = "DELETE FROM photos WHERE name = $1 AND dir_path = $2";

/// Bind parameters of [`DELETE_PHOTO_SQL`], in placeholder order.
fn delete_params(key: &PhotoKey) -> [&(dyn ToSql + Sync); 2] {
    [&key.name, &key.dir_path]
}

/// Build the connection pool described by `db`.
///
/// No connection is opened here; the first checkout connects.
pub fn create_pool(db: &DatabaseConfig) -> anyhow::Result<Pool> {
    let mut cfg = Config::new();

    cfg.host = Some(db.host.clone());
    cfg.port = Some(db.port);
    cfg.user = Some(db.user.clone());
    cfg.password = Some(db.password.clone());
    cfg.dbname = Some(db.name.clone());
    cfg.connect_timeout = Some(db.connect_timeout);

    let mut manager = ManagerConfig::default();
    manager.recycling_method = RecyclingMethod::Verified;
    cfg.manager = Some(manager);

    let mut timeouts = Timeouts::default();
    timeouts.wait = Some(db.connect_timeout);
    timeouts.create = Some(db.connect_timeout);
    timeouts.recycle = Some(db.connect_timeout);

    let mut pool = PoolConfig::new(db.max_connections);
    pool.timeouts = timeouts;
    cfg.pool = Some(pool);

    cfg.create_pool(Some(Runtime::Tokio1), NoTls)
        .context("Failed to create Postgres connection pool")
}

/// Metadata store deleting rows from the `photos` table.
pub struct PostgresPhotoStore {
    pool: Pool,
    idle_timeout: Duration,
}

impl PostgresPhotoStore {
    pub fn new(pool: Pool, idle_timeout: Duration) -> Self {
        Self { pool, idle_timeout }
    }

    /// Drop pooled connections unused for longer than the idle timeout.
    fn evict_idle(&self) {
        let idle_timeout = self.idle_timeout;
        let before = self.pool.status().size;
        self.pool.retain(|_, metrics| metrics.last_used() < idle_timeout);
        let after = self.pool.status().size;

        if after < before {
            debug!(
                "Evicted {} idle database connection(s) (idle_timeout={:?})",
                before - after,
                idle_timeout
            );
        }
    }
}

impl PhotoMetadataStore for PostgresPhotoStore {
    fn delete_photo(
        &self,
        key: &PhotoKey,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<u64>> + Send + '_>> {
        let key = key.clone();
        Box::pin(async move {
            self.evict_idle();

            let client = self
                .pool
                .get()
                .await
                .context("Failed to get database connection")?;

            let statement = client
                .prepare_cached(DELETE_PHOTO_SQL)
                .await
                .context("Failed to prepare photo delete statement")?;

            let rows = client
                .execute(&statement, &delete_params(&key))
                .await
                .with_context(|| {
                    format!(
                        "Failed to delete photo metadata: name={} dir_path={}",
                        key.name, key.dir_path
                    )
                })?;

            Ok(rows)
        })
    }
}
