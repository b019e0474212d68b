//! Data source connectors (verb module)
//!
//! One [`Connector`] per backend kind. Only relational connectors execute
//! rendered plans; files and HTTP APIs support connection tests and
//! introspection.

mod decode;
mod error;
mod file;
mod http;
mod pool;
mod relational;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::catalog::{DataSource, SourceKind};
use crate::config::ServiceConfig;
use crate::renderer::{Dialect, RenderedQuery};

pub use error::ConnectorError;
pub use file::FileConnector;
pub use http::ApiConnector;
pub use pool::{PoolRegistry, RelationalPool};
pub use relational::RelationalConnector;

/// Rows exactly as the backend returned them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRows {
    /// Backend column labels; empty when no rows came back
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// Outcome of a connection test
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionStatus {
    pub ok: bool,
    /// The backend's own message when the test failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
}

impl ConnectionStatus {
    pub fn ok() -> Self {
        Self {
            ok: true,
            diagnostic: None,
        }
    }

    pub fn failed(diagnostic: impl Into<String>) -> Self {
        Self {
            ok: false,
            diagnostic: Some(diagnostic.into()),
        }
    }
}

#[async_trait]
pub trait Connector: Send + Sync {
    async fn test_connection(&self) -> ConnectionStatus;

    async fn list_relations(&self) -> Result<Vec<String>, ConnectorError>;

    async fn list_fields(&self, relation: &str) -> Result<Vec<String>, ConnectorError>;

    /// Query execution, for backends that run SQL
    fn executor(&self) -> Option<&dyn QueryExecutor> {
        None
    }
}

#[async_trait]
pub trait QueryExecutor: Send + Sync {
    fn dialect(&self) -> Dialect;

    /// Run `queries` sequentially on one connection
    async fn execute_all(&self, queries: &[RenderedQuery]) -> Result<Vec<RawRows>, ConnectorError>;

    async fn execute(&self, query: &RenderedQuery) -> Result<RawRows, ConnectorError> {
        let mut results = self.execute_all(std::slice::from_ref(query)).await?;
        results
            .pop()
            .ok_or_else(|| ConnectorError::ConnectionFailure("backend returned no result".into()))
    }
}

/// Build the connector for a data source.
///
/// Relational sources share pools through `pools`; the others are cheap
/// and built per call.
pub fn connector_for(
    source: &DataSource,
    pools: &PoolRegistry,
    config: &ServiceConfig,
) -> Result<Box<dyn Connector>, ConnectorError> {
    match &source.kind {
        SourceKind::Database(db) => {
            let dialect = Dialect::from_db_type(&db.db_type)
                .map_err(|_| ConnectorError::UnsupportedBackend(db.db_type.clone()))?;
            let pool = pools.pool_for(source, db, dialect)?;
            Ok(Box::new(RelationalConnector::new(dialect, pool, config.query_timeout())))
        }
        SourceKind::Excel(file) => Ok(Box::new(FileConnector::new(file.file_path.clone()))),
        SourceKind::Api(api) => Ok(Box::new(ApiConnector::new(api.clone(), config.http.timeout())?)),
    }
}
