//! pivotsql - Compile BI pivot and ad-hoc requests to parameterized SQL
//!
//! This library provides:
//! - Catalog definition types (DataSource, Dataset, Model, DimensionDef, MeasureDef)
//! - Catalog parsing from YAML
//! - Request resolution against a model's join graph
//! - Three-layer pivot plans and flat ad-hoc plans
//! - Dialect-aware SQL rendering with bound parameters
//! - Connectors for SQL databases, tabular files and HTTP APIs
//!
//! # Architecture
//!
//! **Noun modules** (data structures):
//! - `catalog/` - definitions and the `Catalog` collaborator trait
//! - `query/` - request and response types (PivotRequest, AdhocRequest, QueryResult)
//! - `plan/` - structured SELECT trees (SelectSpec, Relation, Expr)
//!
//! **Verb modules** (transformations):
//! - `parser/` - YAML → CatalogFile
//! - `resolver/` - Model + Datasets + PivotRequest → ResolvedQuery
//! - `compiler/` - ResolvedQuery → Plan, Dataset + AdhocRequest → AdhocPlan
//! - `renderer/` - Plan → dialect SQL + parameters
//! - `connector/` - SQL → backend rows; connection tests and introspection
//! - `materializer/` - backend rows → QueryResult
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use pivotsql::{parser, InMemoryCatalog, PivotRequest, QueryService, ServiceConfig};
//!
//! let catalog = InMemoryCatalog::from_file(parser::parse_file("catalog.yaml")?);
//! let service = QueryService::new(Arc::new(catalog), ServiceConfig::load(None)?);
//! let request = PivotRequest {
//!     model_id: 100,
//!     dimensions: vec!["region".into()],
//!     measures: vec!["revenue".into()],
//!     ..Default::default()
//! };
//! let result = service.pivot(&request).await?;
//! ```

pub mod catalog;
pub mod query;
pub mod plan;
pub mod parser;
pub mod resolver;
pub mod compiler;
pub mod renderer;
pub mod connector;
pub mod materializer;
pub mod config;
pub mod service;
pub mod error;

// Re-export commonly used types
pub use catalog::{
    Aggregation, Catalog, CatalogError, CatalogFile, DataSource, DataType, Dataset, FieldRef,
    InMemoryCatalog, JoinKind, Model,
};
pub use query::{AdhocRequest, FilterOperator, FilterPredicate, PivotRequest, QueryResult, SortOrder};
pub use plan::{AdhocPlan, Expr, Plan, ScalarValue, SelectSpec};
pub use resolver::{resolve_pivot, FieldAnchoring, ModelGraph, ResolveError, ResolvedQuery};
pub use compiler::{compile_adhoc, compile_pivot, CompileError};
pub use renderer::{Dialect, Render, RenderError, RenderedQuery, SqlRenderer};
pub use connector::{ConnectionStatus, Connector, ConnectorError, QueryExecutor};
pub use materializer::MaterializeError;
pub use config::{Environment, ServiceConfig};
pub use service::{CompiledAdhoc, CompiledPivot, QueryService};
pub use error::{Error, ErrorKind, ParseError};
