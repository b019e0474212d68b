//! Relational connector: the only backend that executes rendered plans

use std::time::Duration;

use async_trait::async_trait;
use tracing::instrument;

use crate::plan::ScalarValue;
use crate::renderer::{Dialect, RenderedQuery};

use super::decode;
use super::error::{acquire_error, execution_error, ConnectorError};
use super::pool::RelationalPool;
use super::{ConnectionStatus, Connector, QueryExecutor, RawRows};

/// Bind every parameter in order, then fetch on the acquired connection
macro_rules! fetch_on {
    ($conn:expr, $query:expr) => {{
        let mut statement = sqlx::query(&$query.sql);
        for param in &$query.params {
            statement = match param {
                // compiled filters render null as IS [NOT] NULL
                ScalarValue::Null => statement.bind(None::<String>),
                ScalarValue::Bool(v) => statement.bind(*v),
                ScalarValue::Int(v) => statement.bind(*v),
                ScalarValue::Float(v) => statement.bind(*v),
                ScalarValue::Text(v) => statement.bind(v.clone()),
            };
        }
        statement.fetch_all(&mut *$conn).await.map_err(execution_error)
    }};
}

/// A SQL database reached through a pooled driver
#[derive(Debug, Clone)]
pub struct RelationalConnector {
    dialect: Dialect,
    /// `None` for dialects that render but have no driver
    pool: Option<RelationalPool>,
    timeout: Duration,
}

impl RelationalConnector {
    pub fn new(dialect: Dialect, pool: Option<RelationalPool>, timeout: Duration) -> Self {
        Self {
            dialect,
            pool,
            timeout,
        }
    }

    fn pool(&self) -> Result<&RelationalPool, ConnectorError> {
        self.pool
            .as_ref()
            .ok_or_else(|| ConnectorError::UnsupportedBackend(self.dialect.name().to_string()))
    }

    /// Runs `queries` in order on one connection, released on every exit path
    async fn run(&self, queries: &[RenderedQuery]) -> Result<Vec<RawRows>, ConnectorError> {
        let mut results = Vec::with_capacity(queries.len());
        match self.pool()? {
            RelationalPool::Postgres(pool) => {
                let mut conn = pool.acquire().await.map_err(acquire_error)?;
                for query in queries {
                    let rows = fetch_on!(conn, query)?;
                    results.push(decode::postgres_rows(&rows)?);
                }
            }
            RelationalPool::MySql(pool) => {
                let mut conn = pool.acquire().await.map_err(acquire_error)?;
                for query in queries {
                    let rows = fetch_on!(conn, query)?;
                    results.push(decode::mysql_rows(&rows)?);
                }
            }
            RelationalPool::Sqlite(pool) => {
                let mut conn = pool.acquire().await.map_err(acquire_error)?;
                for query in queries {
                    let rows = fetch_on!(conn, query)?;
                    results.push(decode::sqlite_rows(&rows)?);
                }
            }
        }
        Ok(results)
    }

    /// First column of an introspection query, as strings
    async fn names(&self, query: RenderedQuery) -> Result<Vec<String>, ConnectorError> {
        let rows = self.execute(&query).await?;
        Ok(rows
            .rows
            .into_iter()
            .filter_map(|row| row.into_iter().next())
            .filter_map(|value| value.as_str().map(str::to_string))
            .collect())
    }

    fn introspect(&self, sql: &str, params: Vec<ScalarValue>) -> RenderedQuery {
        RenderedQuery {
            sql: sql.to_string(),
            params,
            dialect: self.dialect,
        }
    }
}

#[async_trait]
impl QueryExecutor for RelationalConnector {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    async fn execute_all(&self, queries: &[RenderedQuery]) -> Result<Vec<RawRows>, ConnectorError> {
        tokio::time::timeout(self.timeout, self.run(queries))
            .await
            .map_err(|_| ConnectorError::Timeout(self.timeout))?
    }
}

#[async_trait]
impl Connector for RelationalConnector {
    #[instrument(skip_all, fields(dialect = %self.dialect))]
    async fn test_connection(&self) -> ConnectionStatus {
        match self.execute(&self.introspect("SELECT 1", vec![])).await {
            Ok(_) => ConnectionStatus::ok(),
            Err(err) => ConnectionStatus::failed(err.to_string()),
        }
    }

    #[instrument(skip_all, fields(dialect = %self.dialect), err)]
    async fn list_relations(&self) -> Result<Vec<String>, ConnectorError> {
        let sql = match self.dialect {
            Dialect::Postgres => {
                "SELECT table_name::text FROM information_schema.tables \
                 WHERE table_schema NOT IN ('pg_catalog', 'information_schema') ORDER BY table_name"
            }
            Dialect::MySql => {
                "SELECT CAST(table_name AS CHAR) FROM information_schema.tables \
                 WHERE table_schema = DATABASE() ORDER BY table_name"
            }
            Dialect::Sqlite => {
                "SELECT name FROM sqlite_master \
                 WHERE type IN ('table', 'view') AND name NOT LIKE 'sqlite_%' ORDER BY name"
            }
            Dialect::Oracle | Dialect::SqlServer => {
                return Err(ConnectorError::UnsupportedBackend(self.dialect.name().to_string()))
            }
        };
        self.names(self.introspect(sql, vec![])).await
    }

    #[instrument(skip_all, fields(dialect = %self.dialect, relation = %relation), err)]
    async fn list_fields(&self, relation: &str) -> Result<Vec<String>, ConnectorError> {
        let sql = match self.dialect {
            Dialect::Postgres => {
                "SELECT column_name::text FROM information_schema.columns \
                 WHERE table_name = $1 ORDER BY ordinal_position"
            }
            Dialect::MySql => {
                "SELECT CAST(column_name AS CHAR) FROM information_schema.columns \
                 WHERE table_schema = DATABASE() AND table_name = ? ORDER BY ordinal_position"
            }
            Dialect::Sqlite => "SELECT name FROM pragma_table_info(?) ORDER BY cid",
            Dialect::Oracle | Dialect::SqlServer => {
                return Err(ConnectorError::UnsupportedBackend(self.dialect.name().to_string()))
            }
        };
        let fields = self
            .names(self.introspect(sql, vec![ScalarValue::Text(relation.to_string())]))
            .await?;
        if fields.is_empty() {
            return Err(ConnectorError::RelationNotFound(relation.to_string()));
        }
        Ok(fields)
    }

    fn executor(&self) -> Option<&dyn QueryExecutor> {
        Some(self)
    }
}
