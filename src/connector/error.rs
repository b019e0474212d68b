use std::time::Duration;

/// Errors raised while talking to a data source
#[derive(Debug, thiserror::Error)]
pub enum ConnectorError {
    /// No driver or reader exists for this backend
    #[error("Unsupported backend '{0}'")]
    UnsupportedBackend(String),

    /// The backend could not be reached; carries its own diagnostic
    #[error("Connection failed: {0}")]
    ConnectionFailure(String),

    /// The backend rejected the rendered query text
    #[error("Query rejected by backend: {0}")]
    QuerySyntaxError(String),

    #[error("Query did not finish within {0:?}")]
    Timeout(Duration),

    #[error("Relation '{0}' not found")]
    RelationNotFound(String),

    /// A result column has a backend type with no JSON rendering
    #[error("Column '{column}' has type {type_name}, which cannot be returned")]
    UnsupportedColumnType { column: String, type_name: String },
}

/// Errors while checking out a pooled connection
pub(crate) fn acquire_error(err: sqlx::Error) -> ConnectorError {
    ConnectorError::ConnectionFailure(err.to_string())
}

/// Errors while running a statement on an acquired connection
pub(crate) fn execution_error(err: sqlx::Error) -> ConnectorError {
    match err {
        sqlx::Error::Database(db) => ConnectorError::QuerySyntaxError(db.message().to_string()),
        other => ConnectorError::ConnectionFailure(other.to_string()),
    }
}
