//! Error types for pivotsql

use crate::catalog::CatalogError;
use crate::compiler::CompileError;
use crate::config::ConfigError;
use crate::connector::ConnectorError;
use crate::materializer::MaterializeError;
use crate::renderer::RenderError;
use crate::resolver::ResolveError;

/// Errors that can occur while reading a catalog file
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The document parsed but its definitions contradict each other
    #[error("Invalid catalog: {0}")]
    Invalid(String),
}

/// Anything a query service call can fail with
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Model {0} not found")]
    ModelNotFound(i64),

    #[error("Dataset {0} not found")]
    DatasetNotFound(i64),

    #[error("Data source {0} not found")]
    DataSourceNotFound(i64),

    /// Member datasets read from different data sources
    #[error("Model '{model}' spans data sources {data_sources:?}")]
    CrossSourceModel { model: String, data_sources: Vec<i64> },

    /// The data source exists but cannot run SQL
    #[error("Data source {id} ({kind}) cannot execute queries")]
    NotExecutable { id: i64, kind: &'static str },

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Connector(#[from] ConnectorError),

    #[error(transparent)]
    Materialize(#[from] MaterializeError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Coarse classification callers branch on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ModelNotFound,
    DatasetNotFound,
    DataSourceNotFound,
    FieldNotFound,
    UnresolvedRelationship,
    UnsupportedBackend,
    ConnectionFailure,
    QuerySyntaxError,
    Timeout,
    CrossSourceModel,
    InvalidRequest,
    InvalidDefinition,
    ResultShapeMismatch,
    Catalog,
    Configuration,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::ModelNotFound(_) => ErrorKind::ModelNotFound,
            Error::DatasetNotFound(_) => ErrorKind::DatasetNotFound,
            Error::DataSourceNotFound(_) => ErrorKind::DataSourceNotFound,
            Error::CrossSourceModel { .. } => ErrorKind::CrossSourceModel,
            Error::NotExecutable { .. } => ErrorKind::UnsupportedBackend,
            Error::Resolve(err) => match err {
                ResolveError::EmptyModel(_) => ErrorKind::InvalidDefinition,
                ResolveError::DatasetNotFound(_) => ErrorKind::DatasetNotFound,
                ResolveError::FieldNotFound(_)
                | ResolveError::FieldNotOwned { .. }
                | ResolveError::SortNotRequested(_) => ErrorKind::FieldNotFound,
                ResolveError::UnresolvedRelationship { .. } => ErrorKind::UnresolvedRelationship,
                ResolveError::AliasCollision { .. } | ResolveError::InvalidFilterValue(_) => {
                    ErrorKind::InvalidRequest
                }
            },
            Error::Compile(err) => match err {
                CompileError::CyclicJoinGraph { .. } | CompileError::DisconnectedDataset { .. } => {
                    ErrorKind::UnresolvedRelationship
                }
                CompileError::FieldNotFound(_) => ErrorKind::FieldNotFound,
                CompileError::EmptyQuery
                | CompileError::AliasCollision { .. }
                | CompileError::InvalidFilterValue(_)
                | CompileError::InvalidLimit => ErrorKind::InvalidRequest,
            },
            Error::Render(err) => match err {
                RenderError::UnsupportedBackend(_) => ErrorKind::UnsupportedBackend,
                RenderError::InvalidPlan(_) => ErrorKind::InvalidDefinition,
            },
            Error::Connector(err) => match err {
                ConnectorError::UnsupportedBackend(_) => ErrorKind::UnsupportedBackend,
                ConnectorError::ConnectionFailure(_) => ErrorKind::ConnectionFailure,
                ConnectorError::QuerySyntaxError(_) => ErrorKind::QuerySyntaxError,
                ConnectorError::Timeout(_) => ErrorKind::Timeout,
                ConnectorError::RelationNotFound(_) => ErrorKind::InvalidRequest,
                ConnectorError::UnsupportedColumnType { .. } => ErrorKind::ResultShapeMismatch,
            },
            Error::Materialize(_) => ErrorKind::ResultShapeMismatch,
            Error::Catalog(err) => match err {
                CatalogError::DatasetNotFound(_) => ErrorKind::DatasetNotFound,
                CatalogError::Unavailable(_) => ErrorKind::Catalog,
            },
            Error::Parse(_) => ErrorKind::InvalidDefinition,
            Error::Config(_) => ErrorKind::Configuration,
        }
    }

    /// The unknown field name, when the error is about one
    pub fn missing_field(&self) -> Option<&str> {
        match self {
            Error::Resolve(err) => err.missing_field(),
            Error::Compile(CompileError::FieldNotFound(name)) => Some(name),
            _ => None,
        }
    }
}
