//! Expression types for the query plan

use std::fmt;

use crate::catalog::{Aggregation, DataType};
use crate::query::FilterOperator;

/// A column reference
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Table or derived-table alias; empty for unqualified references
    pub table: String,
    pub name: String,
}

impl Column {
    pub fn new(table: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            name: name.into(),
        }
    }

    /// Create an unqualified column reference (no table prefix)
    pub fn unqualified(name: impl Into<String>) -> Self {
        Self {
            table: String::new(),
            name: name.into(),
        }
    }

    pub fn is_qualified(&self) -> bool {
        !self.table.is_empty()
    }

    /// Fully qualified name: table.column
    pub fn qualified_name(&self) -> String {
        if self.table.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.table, self.name)
        }
    }
}

/// A value that is always sent to the backend as a bound parameter
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl ScalarValue {
    /// Convert a JSON scalar. Arrays and objects have no scalar form.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        use serde_json::Value;
        match value {
            Value::Null => Some(ScalarValue::Null),
            Value::Bool(b) => Some(ScalarValue::Bool(*b)),
            Value::Number(n) => n
                .as_i64()
                .map(ScalarValue::Int)
                .or_else(|| n.as_f64().map(ScalarValue::Float)),
            Value::String(s) => Some(ScalarValue::Text(s.clone())),
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Literal for a filter on a column of the `declared` type.
    ///
    /// `None` when the JSON value is not a scalar, when it cannot be a value
    /// of the declared type, or when null is used with anything but `=`/`!=`.
    /// Like patterns stay as given.
    pub fn for_filter(
        value: &serde_json::Value,
        operator: FilterOperator,
        declared: Option<DataType>,
    ) -> Option<Self> {
        match (operator, Self::from_json(value)?) {
            (FilterOperator::Eq | FilterOperator::NotEq, ScalarValue::Null) => Some(ScalarValue::Null),
            (_, ScalarValue::Null) => None,
            (FilterOperator::Like, value) => Some(value),
            (_, value) => match declared {
                Some(data_type) => value.coerce_to(data_type),
                None => Some(value),
            },
        }
    }

    /// Convert to the family of `data_type`: numeric text becomes a number,
    /// numbers become text for string columns. Other pairs pass through.
    pub fn coerce_to(self, data_type: DataType) -> Option<Self> {
        match (data_type, self) {
            (_, ScalarValue::Null) => Some(ScalarValue::Null),
            (t, ScalarValue::Text(s)) if t.is_numeric() => parse_number(&s),
            (DataType::Boolean, ScalarValue::Text(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "t" | "1" => Some(ScalarValue::Bool(true)),
                "false" | "f" | "0" => Some(ScalarValue::Bool(false)),
                _ => None,
            },
            (DataType::Boolean, ScalarValue::Int(i @ (0 | 1))) => Some(ScalarValue::Bool(i == 1)),
            (DataType::Boolean, ScalarValue::Int(_) | ScalarValue::Float(_)) => None,
            (DataType::String, value @ (ScalarValue::Int(_) | ScalarValue::Float(_) | ScalarValue::Bool(_))) => {
                Some(ScalarValue::Text(value.to_string()))
            }
            (_, value) => Some(value),
        }
    }

    /// Wrap the value for a contains-match
    pub fn contains_pattern(&self) -> ScalarValue {
        match self {
            ScalarValue::Text(s) => ScalarValue::Text(format!("%{}%", s)),
            other => ScalarValue::Text(format!("%{}%", other)),
        }
    }
}

fn parse_number(text: &str) -> Option<ScalarValue> {
    let text = text.trim();
    if let Ok(i) = text.parse::<i64>() {
        return Some(ScalarValue::Int(i));
    }
    text.parse::<f64>()
        .ok()
        .filter(|x| x.is_finite())
        .map(ScalarValue::Float)
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Null => write!(f, "NULL"),
            ScalarValue::Bool(b) => write!(f, "{}", b),
            ScalarValue::Int(i) => write!(f, "{}", i),
            ScalarValue::Float(x) => write!(f, "{}", x),
            ScalarValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Scalar expressions
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Column(Column),
    /// Bound parameter; rendered as a dialect placeholder
    Param(ScalarValue),
    /// `FUNC(arg)` or `COUNT(DISTINCT arg)`
    Aggregate {
        func: Aggregation,
        arg: Box<Expr>,
    },
    /// `COUNT(*)`
    CountAll,
    /// `*`
    Wildcard,
    BinaryOp {
        left: Box<Expr>,
        op: BinaryOperator,
        right: Box<Expr>,
    },
    And(Vec<Expr>),
    /// `expr IS NULL`, or `IS NOT NULL` when negated
    IsNull {
        expr: Box<Expr>,
        negated: bool,
    },
}

impl Expr {
    pub fn column(table: impl Into<String>, name: impl Into<String>) -> Self {
        Expr::Column(Column::new(table, name))
    }

    pub fn aggregate(func: Aggregation, arg: Expr) -> Self {
        Expr::Aggregate {
            func,
            arg: Box::new(arg),
        }
    }

    pub fn binary(left: Expr, op: BinaryOperator, right: Expr) -> Self {
        Expr::BinaryOp {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    pub fn is_null(expr: Expr, negated: bool) -> Self {
        Expr::IsNull {
            expr: Box::new(expr),
            negated,
        }
    }

    /// Combine predicates with AND; `None` when there are none
    pub fn conjunction(mut predicates: Vec<Expr>) -> Option<Expr> {
        match predicates.len() {
            0 => None,
            1 => predicates.pop(),
            _ => Some(Expr::And(predicates)),
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinaryOperator {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Like,
}

impl BinaryOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOperator::Eq => "=",
            BinaryOperator::NotEq => "<>",
            BinaryOperator::Lt => "<",
            BinaryOperator::LtEq => "<=",
            BinaryOperator::Gt => ">",
            BinaryOperator::GtEq => ">=",
            BinaryOperator::Like => "LIKE",
        }
    }
}

impl From<FilterOperator> for BinaryOperator {
    fn from(op: FilterOperator) -> Self {
        match op {
            FilterOperator::Eq => BinaryOperator::Eq,
            FilterOperator::NotEq => BinaryOperator::NotEq,
            FilterOperator::Gt => BinaryOperator::Gt,
            FilterOperator::Lt => BinaryOperator::Lt,
            FilterOperator::GtEq => BinaryOperator::GtEq,
            FilterOperator::LtEq => BinaryOperator::LtEq,
            FilterOperator::Like => BinaryOperator::Like,
        }
    }
}
