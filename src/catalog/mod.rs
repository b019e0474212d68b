//! Catalog definitions (nouns)
//!
//! Data sources, datasets and models as stored by the catalog collaborator,
//! plus the [`Catalog`] trait the query service reads them through.

mod dataset;
mod field;
mod model;
mod source;
mod store;
mod types;

pub use dataset::{Dataset, DatasetDefinition, DatasetRelation, VisualConfig};
pub use field::{normalize_column, FieldDef, FieldRef};
pub use model::{DimensionDef, HierarchyDef, MeasureDef, Model, ModelDataset, Relationship};
pub use source::{ApiConfig, DataSource, DatabaseConfig, FileConfig, HttpMethod, SourceKind};
pub use store::{Catalog, CatalogError, CatalogFile, InMemoryCatalog};
pub use types::{Aggregation, DataType, DatasetRole, JoinKind, ModelType};
