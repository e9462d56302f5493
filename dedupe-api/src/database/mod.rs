pub mod contacts;
pub mod dependents;
pub mod kv_store;
pub mod ledger_storage;
pub mod migrations;
pub mod record_store;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub type PooledSqlite = PooledConnection<SqliteConnectionManager>;

#[derive(Clone)]
pub struct AsyncDbConnection {
    pool: Arc<Pool<SqliteConnectionManager>>,
}

impl AsyncDbConnection {
    pub fn new(pool: Pool<SqliteConnectionManager>) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Blocking checkout, for callers outside an async context.
    pub fn get(&self) -> anyhow::Result<PooledSqlite> {
        self.pool
            .get()
            .map_err(|e| anyhow::anyhow!("Failed to get DB connection from pool: {}", e))
    }

    pub async fn lock(&self) -> anyhow::Result<PooledSqlite> {
        self.get()
    }
}

pub struct Database {
    pub async_connection: AsyncDbConnection,
}

impl Database {
    /// Open (or create) the database file and run migrations
    pub fn new(db_path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Migrate on a plain connection before the pool opens its own
        {
            let conn = Connection::open(db_path)?;
            migrations::run_migrations(&conn)?;
        }

        let manager = SqliteConnectionManager::file(db_path).with_init(|conn| {
            conn.busy_timeout(Duration::from_secs(5))?;
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
            Ok(())
        });

        let pool = Pool::builder().max_size(8).build(manager)?;

        Ok(Database {
            async_connection: AsyncDbConnection::new(pool),
        })
    }
}
