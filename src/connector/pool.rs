//! Per-data-source connection pools

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::str::FromStr as _;

use dashmap::DashMap;
use sqlx::{
    mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions},
    postgres::{PgConnectOptions, PgPool, PgPoolOptions},
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions},
};
use tracing::debug;

use crate::catalog::{DataSource, DatabaseConfig};
use crate::config::PoolSettings;
use crate::renderer::Dialect;

use super::error::ConnectorError;

/// A pool for one of the backends sqlx can drive
#[derive(Debug, Clone)]
pub enum RelationalPool {
    Postgres(PgPool),
    MySql(MySqlPool),
    Sqlite(SqlitePool),
}

impl RelationalPool {
    /// Build a lazily connecting pool; nothing is dialed until first acquire.
    ///
    /// Returns `Ok(None)` for dialects that render but have no driver.
    fn connect_lazy(
        dialect: Dialect,
        db: &DatabaseConfig,
        size: u32,
        settings: &PoolSettings,
    ) -> Result<Option<Self>, ConnectorError> {
        let size = size.max(1);
        let pool = match dialect {
            Dialect::Postgres => {
                let mut options = PgConnectOptions::new();
                if let Some(host) = &db.host {
                    options = options.host(host);
                }
                if let Some(port) = db.port {
                    options = options.port(port);
                }
                if let Some(database) = &db.database {
                    options = options.database(database);
                }
                if let Some(username) = &db.username {
                    options = options.username(username);
                }
                if let Some(password) = &db.password {
                    options = options.password(password);
                }
                RelationalPool::Postgres(
                    PgPoolOptions::new()
                        .max_connections(size)
                        .acquire_timeout(settings.acquire_timeout())
                        .idle_timeout(settings.idle_timeout())
                        .connect_lazy_with(options),
                )
            }
            Dialect::MySql => {
                let mut options = MySqlConnectOptions::new();
                if let Some(host) = &db.host {
                    options = options.host(host);
                }
                if let Some(port) = db.port {
                    options = options.port(port);
                }
                if let Some(database) = &db.database {
                    options = options.database(database);
                }
                if let Some(username) = &db.username {
                    options = options.username(username);
                }
                if let Some(password) = &db.password {
                    options = options.password(password);
                }
                RelationalPool::MySql(
                    MySqlPoolOptions::new()
                        .max_connections(size)
                        .acquire_timeout(settings.acquire_timeout())
                        .idle_timeout(settings.idle_timeout())
                        .connect_lazy_with(options),
                )
            }
            Dialect::Sqlite => {
                let path = db.database.as_deref().ok_or_else(|| {
                    ConnectorError::ConnectionFailure("sqlite data source has no database path".into())
                })?;
                let options = if path.starts_with("sqlite:") {
                    SqliteConnectOptions::from_str(path).map_err(|err| {
                        ConnectorError::ConnectionFailure(err.to_string())
                    })?
                } else {
                    SqliteConnectOptions::new().filename(path)
                };
                RelationalPool::Sqlite(
                    SqlitePoolOptions::new()
                        .max_connections(size)
                        .acquire_timeout(settings.acquire_timeout())
                        .idle_timeout(settings.idle_timeout())
                        .connect_lazy_with(options),
                )
            }
            Dialect::Oracle | Dialect::SqlServer => return Ok(None),
        };
        Ok(Some(pool))
    }
}

/// Pools keyed by DataSource id.
///
/// Each entry remembers a fingerprint of the connection settings it was built
/// from; a changed definition replaces the pool instead of reusing it.
#[derive(Debug, Default)]
pub struct PoolRegistry {
    pools: DashMap<i64, (u64, RelationalPool)>,
    settings: PoolSettings,
}

impl PoolRegistry {
    pub fn new(settings: PoolSettings) -> Self {
        Self {
            pools: DashMap::new(),
            settings,
        }
    }

    /// The pool for `source`, created on first use.
    ///
    /// `Ok(None)` means the dialect has no driver.
    pub fn pool_for(
        &self,
        source: &DataSource,
        db: &DatabaseConfig,
        dialect: Dialect,
    ) -> Result<Option<RelationalPool>, ConnectorError> {
        let fingerprint = fingerprint(db, source.connection_pool);

        if let Some(entry) = self.pools.get(&source.id) {
            let (existing, pool) = entry.value();
            if *existing == fingerprint {
                return Ok(Some(pool.clone()));
            }
        }

        let Some(pool) = RelationalPool::connect_lazy(dialect, db, source.connection_pool, &self.settings)?
        else {
            return Ok(None);
        };
        debug!(
            data_source = source.id,
            dialect = %dialect,
            size = source.connection_pool,
            "created connection pool"
        );
        self.pools.insert(source.id, (fingerprint, pool.clone()));
        Ok(Some(pool))
    }

    /// Number of live pools
    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }
}

fn fingerprint(db: &DatabaseConfig, size: u32) -> u64 {
    let mut hasher = DefaultHasher::new();
    db.hash(&mut hasher);
    size.hash(&mut hasher);
    hasher.finish()
}
