//! SQL rendering (verb module)
//!
//! Plan → dialect-specific text with bound parameters.

mod dialect;
mod error;
mod sql;

pub use dialect::{Dialect, DialectSpec, Pagination, Placeholder};
pub use error::RenderError;
pub use sql::{Render, RenderedQuery, SqlRenderer};
