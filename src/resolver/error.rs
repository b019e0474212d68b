/// Errors that can occur while resolving a request against a model
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("Model '{0}' has no member datasets")]
    EmptyModel(String),

    #[error("Dataset {0} is a member of the model but was not loaded")]
    DatasetNotFound(i64),

    /// A requested, filtered or sorted name is not known to the model
    #[error("Field '{0}' not found")]
    FieldNotFound(String),

    /// A definition points at a column that no member dataset declares
    #[error("'{definition}' refers to '{field}', which no member dataset declares")]
    FieldNotOwned { definition: String, field: String },

    #[error("Relationship in model '{model}' references dataset {dataset_id}, which is not a member")]
    UnresolvedRelationship { model: String, dataset_id: i64 },

    #[error("'{first}' and '{second}' both produce output column '{alias}'")]
    AliasCollision {
        first: String,
        second: String,
        alias: String,
    },

    #[error("Filter on '{0}' needs a scalar value its column type accepts")]
    InvalidFilterValue(String),

    #[error("Sort field '{0}' is not a requested dimension or measure")]
    SortNotRequested(String),
}

impl ResolveError {
    /// The unknown name, for errors that report one
    pub fn missing_field(&self) -> Option<&str> {
        match self {
            ResolveError::FieldNotFound(name) | ResolveError::SortNotRequested(name) => Some(name),
            ResolveError::FieldNotOwned { field, .. } => Some(field),
            _ => None,
        }
    }
}
