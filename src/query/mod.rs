//! Request and response types (nouns)

mod request;
mod response;

pub use request::{AdhocRequest, FilterOperator, FilterPredicate, PivotRequest, SortOrder};
pub use response::{Diagnostics, QueryResult, Row};
