//! Query plan types (noun module)
//!
//! Structured SELECT trees produced by the compiler and consumed by the
//! renderer. Values never appear as text here; they travel as bound
//! parameters.

mod expr;
mod node;

pub use expr::{BinaryOperator, Column, Expr, ScalarValue};
pub use node::{AdhocPlan, Join, Page, Plan, Relation, SelectItem, SelectSpec, SortKey};
