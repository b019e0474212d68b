//! Dataset definitions

use serde::{Deserialize, Serialize};

use super::field::{normalize_column, FieldDef};

fn default_refresh_interval() -> u64 {
    300
}

fn default_true() -> bool {
    true
}

/// One logical relation with a declared field list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub data_source_id: i64,
    #[serde(flatten)]
    pub definition: DatasetDefinition,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: u64,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// How the dataset was authored, tagged by `creation_mode`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "creation_mode", rename_all = "lowercase")]
pub enum DatasetDefinition {
    /// A stored query, used verbatim
    Sql { sql_query: String },
    /// A projection over physical tables
    Visual { visual_config: VisualConfig },
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VisualConfig {
    /// Physical tables; the first one is the relation the dataset reads
    #[serde(default)]
    pub tables: Vec<String>,
    /// Builder state kept for the authoring UI; queries ignore it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregations: Option<serde_json::Value>,
}

/// What a dataset reads from when it appears in a FROM clause
#[derive(Debug, Clone, PartialEq)]
pub enum DatasetRelation<'a> {
    /// A physical table, possibly schema-qualified
    Table(&'a str),
    /// Stored query text, wrapped as a derived table
    Query(&'a str),
}

impl Dataset {
    pub fn relation(&self) -> DatasetRelation<'_> {
        match &self.definition {
            DatasetDefinition::Sql { sql_query } => DatasetRelation::Query(sql_query),
            DatasetDefinition::Visual { visual_config } => DatasetRelation::Table(
                visual_config
                    .tables
                    .first()
                    .map(String::as_str)
                    .unwrap_or(&self.name),
            ),
        }
    }

    pub fn physical_table(&self) -> Option<&str> {
        match self.relation() {
            DatasetRelation::Table(table) => Some(table),
            DatasetRelation::Query(_) => None,
        }
    }

    pub fn is_sql_mode(&self) -> bool {
        matches!(self.definition, DatasetDefinition::Sql { .. })
    }

    /// Look up a declared field by name; both sides are normalized.
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        let column = normalize_column(name);
        self.fields.iter().find(|f| f.column() == column)
    }

    pub fn owns(&self, column: &str) -> bool {
        self.field(column).is_some()
    }

    /// True when `qualifier` names this dataset or its physical table
    pub fn answers_to(&self, qualifier: &str) -> bool {
        if self.name == qualifier {
            return true;
        }
        match self.physical_table() {
            Some(table) => table == qualifier || normalize_column(table) == qualifier,
            None => false,
        }
    }
}
