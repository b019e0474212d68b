//! Dimensional model definitions

use serde::{Deserialize, Serialize};

use super::types::{Aggregation, DatasetRole, JoinKind, ModelType};

fn default_true() -> bool {
    true
}

/// A join graph of datasets plus the dimensions and measures it exposes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub model_type: ModelType,
    /// Member datasets in declared order; the first one drives the query
    pub data_sets: Vec<ModelDataset>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    #[serde(default)]
    pub dimensions: Vec<DimensionDef>,
    #[serde(default)]
    pub measures: Vec<MeasureDef>,
    #[serde(default)]
    pub hierarchies: Vec<HierarchyDef>,
    /// Free-form grain descriptor, e.g. "one row per order line"
    #[serde(default)]
    pub grain: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDataset {
    pub data_set_id: i64,
    #[serde(default)]
    pub role: DatasetRole,
    #[serde(default)]
    pub alias: Option<String>,
}

/// An equi-join between two member datasets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub source_data_set: i64,
    pub source_field: String,
    pub target_data_set: i64,
    pub target_field: String,
    #[serde(default)]
    pub join_type: JoinKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionDef {
    pub name: String,
    /// `column` or `dataset.column`; the name is used when absent
    #[serde(default)]
    pub field: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub hierarchy: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasureDef {
    pub name: String,
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub aggregation: Aggregation,
    /// Display format hint for the presentation layer
    #[serde(default)]
    pub format: Option<String>,
}

/// An ordered drill path over dimensions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HierarchyDef {
    pub name: String,
    pub levels: Vec<String>,
}

impl Model {
    pub fn dimension(&self, name: &str) -> Option<&DimensionDef> {
        self.dimensions.iter().find(|d| d.name == name)
    }

    pub fn measure(&self, name: &str) -> Option<&MeasureDef> {
        self.measures.iter().find(|m| m.name == name)
    }

    pub fn hierarchy(&self, name: &str) -> Option<&HierarchyDef> {
        self.hierarchies.iter().find(|h| h.name == name)
    }

    pub fn driving_dataset_id(&self) -> Option<i64> {
        self.data_sets.first().map(|d| d.data_set_id)
    }

    pub fn is_member(&self, dataset_id: i64) -> bool {
        self.data_sets.iter().any(|d| d.data_set_id == dataset_id)
    }

    pub fn member_ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.data_sets.iter().map(|d| d.data_set_id)
    }

    /// Dimensions on the given hierarchy, in level order
    pub fn hierarchy_dimensions(&self, name: &str) -> Vec<&DimensionDef> {
        let Some(hierarchy) = self.hierarchy(name) else {
            return vec![];
        };
        hierarchy
            .levels
            .iter()
            .filter_map(|level| self.dimension(level))
            .collect()
    }
}
