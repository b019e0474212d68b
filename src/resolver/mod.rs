mod error;
mod graph;
mod resolve;
mod types;

pub use error::ResolveError;
pub use graph::{Member, ModelGraph};
pub use resolve::{check_requested_names, output_suffix, resolve_pivot, FieldAnchoring};
pub use types::{
    BoundField, ResolvedDimension, ResolvedFilter, ResolvedMeasure, ResolvedQuery, ResolvedSort,
};
