//! Backend rows → JSON values

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::{Number, Value};
use sqlx::types::{BigDecimal, JsonValue, Uuid};
use sqlx::{
    mysql::MySqlRow, postgres::PgRow, sqlite::SqliteRow, Column as _, ColumnIndex, Row, TypeInfo as _,
    ValueRef as _,
};

use super::error::ConnectorError;
use super::RawRows;

/// Try each Rust type in turn; the first one the column accepts wins.
/// A NULL decodes as `Value::Null` under any type. A value no listed type
/// accepts is an error naming the column and its backend type.
macro_rules! decode_cell {
    ($row:expr, $idx:expr; $($ty:ty => $conv:expr),+ $(,)?) => {
        'decode: {
            $(
                if let Ok(value) = $row.try_get::<Option<$ty>, _>($idx) {
                    break 'decode Ok(value.map($conv).unwrap_or(Value::Null));
                }
            )+
            undecodable($row, $idx)
        }
    };
}

fn undecodable<R>(row: &R, idx: usize) -> Result<Value, ConnectorError>
where
    R: Row,
    usize: ColumnIndex<R>,
{
    if row.try_get_raw(idx).is_ok_and(|raw| raw.is_null()) {
        return Ok(Value::Null);
    }
    let (column, type_name) = match row.columns().get(idx) {
        Some(column) => (column.name().to_string(), column.type_info().name().to_string()),
        None => (idx.to_string(), "unknown".to_string()),
    };
    Err(ConnectorError::UnsupportedColumnType { column, type_name })
}

fn float(value: f64) -> Value {
    Number::from_f64(value).map(Value::Number).unwrap_or(Value::Null)
}

/// Integral decimals become integers, the rest floats; text only when
/// neither fits.
fn decimal(value: BigDecimal) -> Value {
    let text = value.to_string();
    if let Ok(int) = text.parse::<i64>() {
        return Value::from(int);
    }
    match text.parse::<f64>() {
        Ok(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Value::from(f as i64),
        Ok(f) if f.is_finite() => float(f),
        _ => Value::String(text),
    }
}

fn uuid(value: Uuid) -> Value {
    Value::from(value.hyphenated().to_string())
}

/// `bytea` in the backend's own hex output format
fn hex_bytes(value: Vec<u8>) -> Value {
    let mut text = String::with_capacity(2 + value.len() * 2);
    text.push_str("\\x");
    for byte in value {
        text.push_str(&format!("{:02x}", byte));
    }
    Value::from(text)
}

fn lossy_text(value: Vec<u8>) -> Value {
    Value::from(String::from_utf8_lossy(&value).into_owned())
}

fn is_json_column<R: Row>(row: &R, idx: usize) -> bool {
    row.columns()
        .get(idx)
        .is_some_and(|c| c.type_info().name().eq_ignore_ascii_case("json"))
}

fn column_names<R: Row>(row: &R) -> Vec<String> {
    row.columns().iter().map(|c| c.name().to_string()).collect()
}

pub(crate) fn postgres_rows(rows: &[PgRow]) -> Result<RawRows, ConnectorError> {
    let columns = rows.first().map(column_names).unwrap_or_default();
    let rows = rows
        .iter()
        .map(|row| {
            (0..row.len())
                .map(|i| {
                    decode_cell!(row, i;
                        bool => Value::from,
                        i16 => Value::from,
                        i32 => Value::from,
                        i64 => Value::from,
                        f32 => |v: f32| float(v as f64),
                        f64 => float,
                        BigDecimal => decimal,
                        String => Value::from,
                        JsonValue => |v: JsonValue| v,
                        Uuid => uuid,
                        DateTime<Utc> => |v: DateTime<Utc>| Value::from(v.to_rfc3339()),
                        NaiveDateTime => |v: NaiveDateTime| Value::from(v.to_string()),
                        NaiveDate => |v: NaiveDate| Value::from(v.to_string()),
                        NaiveTime => |v: NaiveTime| Value::from(v.to_string()),
                        Vec<u8> => hex_bytes,
                        Vec<String> => Value::from,
                        Vec<i64> => Value::from,
                        Vec<i32> => Value::from,
                    )
                })
                .collect::<Result<Vec<_>, _>>()
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(RawRows { columns, rows })
}

pub(crate) fn mysql_rows(rows: &[MySqlRow]) -> Result<RawRows, ConnectorError> {
    let columns = rows.first().map(column_names).unwrap_or_default();
    let rows = rows
        .iter()
        .map(|row| {
            (0..row.len())
                .map(|i| {
                    // text columns also decode as JSON here, so only JSON columns try it
                    if is_json_column(row, i) {
                        let cell = decode_cell!(row, i; JsonValue => |v: JsonValue| v);
                        return cell;
                    }
                    decode_cell!(row, i;
                        i64 => Value::from,
                        u64 => Value::from,
                        f64 => float,
                        BigDecimal => decimal,
                        String => Value::from,
                        NaiveDateTime => |v: NaiveDateTime| Value::from(v.to_string()),
                        NaiveDate => |v: NaiveDate| Value::from(v.to_string()),
                        NaiveTime => |v: NaiveTime| Value::from(v.to_string()),
                        Vec<u8> => lossy_text,
                    )
                })
                .collect::<Result<Vec<_>, _>>()
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(RawRows { columns, rows })
}

/// SQLite has no boolean or temporal storage class, so none are tried
pub(crate) fn sqlite_rows(rows: &[SqliteRow]) -> Result<RawRows, ConnectorError> {
    let columns = rows.first().map(column_names).unwrap_or_default();
    let rows = rows
        .iter()
        .map(|row| {
            (0..row.len())
                .map(|i| {
                    decode_cell!(row, i;
                        i64 => Value::from,
                        f64 => float,
                        String => Value::from,
                        Vec<u8> => lossy_text,
                    )
                })
                .collect::<Result<Vec<_>, _>>()
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(RawRows { columns, rows })
}
