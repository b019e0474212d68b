use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A row keyed by output column name
pub type Row = Map<String, Value>;

/// Tabular result of a pivot or ad-hoc query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    /// Output columns in request order
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    /// Rows matching the predicate, ignoring pagination (ad-hoc only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    /// Rendered query text; only populated outside production
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<Diagnostics>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub sql: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count_sql: Option<String>,
}

impl QueryResult {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
