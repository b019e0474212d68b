/// Errors that can occur while building a plan
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("Query requests no dimensions and no measures")]
    EmptyQuery,

    /// A relationship joins two datasets that are already joined
    #[error("Relationships in model '{model}' form a cycle between datasets {left} and {right}")]
    CyclicJoinGraph { model: String, left: i64, right: i64 },

    /// A dataset cannot be reached from the driving dataset
    #[error("Dataset '{dataset}' in model '{model}' is not connected to the driving dataset")]
    DisconnectedDataset { model: String, dataset: String },

    /// Ad-hoc request names a field the dataset does not declare
    #[error("Field '{0}' not found")]
    FieldNotFound(String),

    /// Two requested fields normalize to the same output column
    #[error("'{first}' and '{second}' both produce output column '{alias}'")]
    AliasCollision {
        first: String,
        second: String,
        alias: String,
    },

    #[error("Filter on '{0}' needs a scalar value its column type accepts")]
    InvalidFilterValue(String),

    #[error("Limit must be greater than zero")]
    InvalidLimit,
}
