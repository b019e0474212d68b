//! Plan construction (verb module)
//!
//! ResolvedQuery → [`Plan`](crate::plan::Plan) for pivots, and
//! Dataset + AdhocRequest → [`AdhocPlan`](crate::plan::AdhocPlan).

mod adhoc;
mod error;
mod joins;
mod pivot;

pub use adhoc::{compile_adhoc, ADHOC_QUERY_ALIAS, ADHOC_TABLE_ALIAS, TOTAL_COLUMN};
pub use error::CompileError;
pub use joins::{member_relation, plan_joins};
pub use pivot::{
    compile_pivot, DATASET_PREFIX, DATASET_QUERY_ALIAS, MODEL_PREFIX, MODEL_QUERY_ALIAS, PIVOT_PREFIX,
};
