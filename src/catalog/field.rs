//! Dataset fields and references to them

use std::fmt;

use serde::{Deserialize, Serialize};
use super::types::DataType;

/// A field declared on a dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type", default)]
    pub data_type: DataType,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub is_dimension: bool,
    #[serde(default)]
    pub is_measure: bool,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            alias: None,
            is_dimension: false,
            is_measure: false,
        }
    }

    /// Physical column name, with any `table.` qualifier removed
    pub fn column(&self) -> &str {
        normalize_column(&self.name)
    }
}

/// Strip everything up to and including the last `.`.
///
/// This is the one normalization rule applied to every field reference,
/// whether it comes from a definition, a request, or a relationship.
pub fn normalize_column(raw: &str) -> &str {
    raw.rsplit_once('.').map(|(_, column)| column).unwrap_or(raw)
}

/// A definition's reference to a physical column, normalized once.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldRef {
    /// `column`
    Bare(String),
    /// `dataset.column` (or `schema.table.column`; the qualifier keeps every
    /// part before the last dot)
    Qualified { qualifier: String, column: String },
    /// The definition omitted `field`; its logical name is used as the column
    Implicit(String),
}

impl FieldRef {
    pub fn parse(raw: &str) -> Self {
        match raw.rsplit_once('.') {
            Some((qualifier, column)) if !qualifier.is_empty() => FieldRef::Qualified {
                qualifier: qualifier.to_string(),
                column: column.to_string(),
            },
            Some((_, column)) => FieldRef::Bare(column.to_string()),
            None => FieldRef::Bare(raw.to_string()),
        }
    }

    /// Build the reference for a dimension or measure definition.
    pub fn for_definition(name: &str, field: Option<&str>) -> Self {
        match field.map(str::trim).filter(|f| !f.is_empty()) {
            Some(field) => FieldRef::parse(field),
            None => FieldRef::Implicit(normalize_column(name).to_string()),
        }
    }

    pub fn column(&self) -> &str {
        match self {
            FieldRef::Bare(column) => column,
            FieldRef::Qualified { column, .. } => column,
            FieldRef::Implicit(column) => column,
        }
    }

    pub fn qualifier(&self) -> Option<&str> {
        match self {
            FieldRef::Qualified { qualifier, .. } => Some(qualifier),
            _ => None,
        }
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldRef::Qualified { qualifier, column } => write!(f, "{}.{}", qualifier, column),
            FieldRef::Bare(column) | FieldRef::Implicit(column) => f.write_str(column),
        }
    }
}
