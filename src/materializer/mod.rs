//! Result materialization (verb module)
//!
//! Backend rows → [`QueryResult`] keyed by the plan's output names.

use serde_json::{Map, Value};

use crate::compiler::TOTAL_COLUMN;
use crate::connector::{QueryExecutor, RawRows};
use crate::error::Error;
use crate::query::{QueryResult, Row};
use crate::renderer::RenderedQuery;

/// Errors raised when backend rows do not fit the plan
#[derive(Debug, thiserror::Error)]
pub enum MaterializeError {
    #[error("Result has no column '{column}' (backend returned {actual:?})")]
    ResultShapeMismatch { column: String, actual: Vec<String> },

    #[error("Count query returned no usable total")]
    MissingTotal,
}

/// Position of `name` among the backend's labels.
///
/// Exact match first, then case-insensitive for backends that fold
/// unquoted labels.
fn position(labels: &[String], name: &str) -> Option<usize> {
    labels
        .iter()
        .position(|l| l == name)
        .or_else(|| labels.iter().position(|l| l.eq_ignore_ascii_case(name)))
}

/// Key each row by output name.
///
/// With `columns` given, rows carry exactly those keys and the result lists
/// them even when no rows came back. Without, the backend's labels are used.
pub fn materialize(columns: Option<&[String]>, raw: RawRows) -> Result<QueryResult, MaterializeError> {
    let Some(columns) = columns else {
        let rows = raw
            .rows
            .into_iter()
            .map(|values| raw.columns.iter().cloned().zip(values).collect::<Row>())
            .collect();
        return Ok(QueryResult {
            columns: raw.columns,
            rows,
            ..Default::default()
        });
    };

    if raw.rows.is_empty() {
        return Ok(QueryResult {
            columns: columns.to_vec(),
            ..Default::default()
        });
    }

    let positions = columns
        .iter()
        .map(|name| {
            position(&raw.columns, name).ok_or_else(|| MaterializeError::ResultShapeMismatch {
                column: name.clone(),
                actual: raw.columns.clone(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let rows = raw
        .rows
        .into_iter()
        .map(|values| {
            let mut row = Map::with_capacity(columns.len());
            for (name, &idx) in columns.iter().zip(&positions) {
                row.insert(name.clone(), values.get(idx).cloned().unwrap_or(Value::Null));
            }
            row
        })
        .collect();

    Ok(QueryResult {
        columns: columns.to_vec(),
        rows,
        ..Default::default()
    })
}

/// The single count a count query returns
pub fn extract_total(raw: &RawRows) -> Result<u64, MaterializeError> {
    let idx = position(&raw.columns, TOTAL_COLUMN).unwrap_or(0);
    let value = raw
        .rows
        .first()
        .and_then(|row| row.get(idx))
        .ok_or(MaterializeError::MissingTotal)?;
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .ok_or(MaterializeError::MissingTotal)
}

/// Run a rendered pivot and key its rows by the plan's columns
pub async fn run_pivot(
    executor: &dyn QueryExecutor,
    query: &RenderedQuery,
    columns: &[String],
) -> Result<QueryResult, Error> {
    let raw = executor.execute(query).await?;
    Ok(materialize(Some(columns), raw)?)
}

/// Run the row and count queries of an ad-hoc request on one connection
pub async fn run_adhoc(
    executor: &dyn QueryExecutor,
    rows: &RenderedQuery,
    count: &RenderedQuery,
    columns: Option<&[String]>,
) -> Result<QueryResult, Error> {
    let mut results = executor
        .execute_all(&[rows.clone(), count.clone()])
        .await?
        .into_iter();
    let (Some(raw_rows), Some(raw_count)) = (results.next(), results.next()) else {
        return Err(MaterializeError::MissingTotal.into());
    };

    let mut result = materialize(columns, raw_rows)?;
    result.total = Some(extract_total(&raw_count)?);
    Ok(result)
}
