//! Scalar enums shared by catalog definitions

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Declared type of a dataset field.
///
/// Only the family is kept; the compiler uses it to convert filter literals
/// before they are bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DataType {
    Integer,
    Float,
    /// Fixed-point decimal with precision and scale
    Decimal { precision: u8, scale: u8 },
    Boolean,
    #[default]
    String,
    Date,
    Timestamp,
}

impl DataType {
    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Integer | DataType::Float | DataType::Decimal { .. })
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Integer => write!(f, "integer"),
            DataType::Float => write!(f, "float"),
            DataType::Decimal { precision, scale } => write!(f, "decimal({}, {})", precision, scale),
            DataType::Boolean => write!(f, "boolean"),
            DataType::String => write!(f, "string"),
            DataType::Date => write!(f, "date"),
            DataType::Timestamp => write!(f, "timestamp"),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("Invalid data type '{input}': {message}")]
pub struct ParseDataTypeError {
    pub input: String,
    pub message: &'static str,
}

impl ParseDataTypeError {
    fn new(input: &str, message: &'static str) -> Self {
        Self {
            input: input.to_string(),
            message,
        }
    }
}

impl FromStr for DataType {
    type Err = ParseDataTypeError;

    /// Accepts the names backends and catalog editors use, e.g. `bigint`,
    /// `VARCHAR(255)`, `numeric` or `decimal(12, 2)`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let (base, args) = match lower.split_once('(') {
            Some((base, rest)) => {
                let args = rest
                    .strip_suffix(')')
                    .ok_or_else(|| ParseDataTypeError::new(s, "unclosed type arguments"))?;
                (base.trim(), Some(args))
            }
            None => (lower.as_str(), None),
        };

        let data_type = match base {
            "int" | "integer" | "tinyint" | "smallint" | "bigint" | "long" | "i8" | "i16" | "i32"
            | "i64" => DataType::Integer,
            "float" | "double" | "real" | "number" | "f32" | "f64" => DataType::Float,
            "decimal" | "numeric" => match args {
                Some(args) => decimal(s, args)?,
                None => DataType::Float,
            },
            "bool" | "boolean" => DataType::Boolean,
            "string" | "str" | "text" | "varchar" | "char" => DataType::String,
            "date" => DataType::Date,
            "timestamp" | "datetime" => DataType::Timestamp,
            _ => return Err(ParseDataTypeError::new(s, "unknown type")),
        };
        Ok(data_type)
    }
}

fn decimal(input: &str, args: &str) -> Result<DataType, ParseDataTypeError> {
    let (precision, scale) = args
        .split_once(',')
        .ok_or_else(|| ParseDataTypeError::new(input, "decimal needs precision and scale, e.g. decimal(12, 2)"))?;
    let precision: u8 = precision
        .trim()
        .parse()
        .map_err(|_| ParseDataTypeError::new(input, "invalid precision"))?;
    let scale: u8 = scale
        .trim()
        .parse()
        .map_err(|_| ParseDataTypeError::new(input, "invalid scale"))?;

    if !(1..=38).contains(&precision) {
        return Err(ParseDataTypeError::new(input, "precision must be between 1 and 38"));
    }
    if scale > precision {
        return Err(ParseDataTypeError::new(input, "scale cannot exceed precision"));
    }
    Ok(DataType::Decimal { precision, scale })
}

impl TryFrom<String> for DataType {
    type Error = ParseDataTypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DataType> for String {
    fn from(value: DataType) -> Self {
        value.to_string()
    }
}

// ============================================================================
// Aggregation
// ============================================================================

/// Aggregation applied to a measure in the base layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Aggregation {
    #[default]
    Sum,
    Avg,
    Count,
    CountDistinct,
    Min,
    Max,
}

impl Aggregation {
    /// SQL function name, without the argument list
    pub fn sql_name(&self) -> &'static str {
        match self {
            Aggregation::Sum => "SUM",
            Aggregation::Avg => "AVG",
            Aggregation::Count | Aggregation::CountDistinct => "COUNT",
            Aggregation::Min => "MIN",
            Aggregation::Max => "MAX",
        }
    }

    pub fn is_distinct(&self) -> bool {
        matches!(self, Aggregation::CountDistinct)
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Aggregation::Sum => write!(f, "sum"),
            Aggregation::Avg => write!(f, "avg"),
            Aggregation::Count => write!(f, "count"),
            Aggregation::CountDistinct => write!(f, "count_distinct"),
            Aggregation::Min => write!(f, "min"),
            Aggregation::Max => write!(f, "max"),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("Unknown aggregation '{input}'. Valid options: sum, avg, count, count_distinct, min, max")]
pub struct ParseAggregationError {
    pub input: String,
}

impl FromStr for Aggregation {
    type Err = ParseAggregationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sum" => Ok(Aggregation::Sum),
            "avg" | "average" | "mean" => Ok(Aggregation::Avg),
            "count" => Ok(Aggregation::Count),
            "count_distinct" | "countdistinct" | "distinct_count" | "distinctcount" => {
                Ok(Aggregation::CountDistinct)
            }
            "min" | "minimum" => Ok(Aggregation::Min),
            "max" | "maximum" => Ok(Aggregation::Max),
            _ => Err(ParseAggregationError { input: s.to_string() }),
        }
    }
}

impl<'de> Deserialize<'de> for Aggregation {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Aggregation::from_str(&s).map_err(serde::de::Error::custom)
    }
}

impl Serialize for Aggregation {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

// ============================================================================
// Join kind
// ============================================================================

/// Join kind declared on a relationship
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JoinKind {
    #[default]
    Inner,
    Left,
    Right,
}

impl JoinKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
        }
    }

    /// The kind to use when the relationship is walked from target to source.
    pub fn mirrored(&self) -> JoinKind {
        match self {
            JoinKind::Inner => JoinKind::Inner,
            JoinKind::Left => JoinKind::Right,
            JoinKind::Right => JoinKind::Left,
        }
    }
}

impl fmt::Display for JoinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinKind::Inner => write!(f, "inner"),
            JoinKind::Left => write!(f, "left"),
            JoinKind::Right => write!(f, "right"),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("Unknown join type '{input}'. Valid options: inner, left, right")]
pub struct ParseJoinKindError {
    pub input: String,
}

impl FromStr for JoinKind {
    type Err = ParseJoinKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "inner" | "inner join" => Ok(JoinKind::Inner),
            "left" | "left outer" | "left join" => Ok(JoinKind::Left),
            "right" | "right outer" | "right join" => Ok(JoinKind::Right),
            _ => Err(ParseJoinKindError { input: s.to_string() }),
        }
    }
}

impl<'de> Deserialize<'de> for JoinKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        JoinKind::from_str(&s).map_err(serde::de::Error::custom)
    }
}

impl Serialize for JoinKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

// ============================================================================
// Model classification
// ============================================================================

/// Role of a dataset within a model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetRole {
    Fact,
    #[default]
    Dimension,
}

/// Shape of the model's join graph, as declared by its author
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelType {
    #[default]
    Star,
    Snowflake,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_type_families() {
        assert_eq!("int".parse::<DataType>().unwrap(), DataType::Integer);
        assert_eq!("BIGINT".parse::<DataType>().unwrap(), DataType::Integer);
        assert_eq!("int(11)".parse::<DataType>().unwrap(), DataType::Integer);
        assert_eq!("number".parse::<DataType>().unwrap(), DataType::Float);
        assert_eq!("numeric".parse::<DataType>().unwrap(), DataType::Float);
        assert_eq!("VARCHAR(255)".parse::<DataType>().unwrap(), DataType::String);
        assert_eq!("datetime".parse::<DataType>().unwrap(), DataType::Timestamp);
        assert_eq!("boolean".parse::<DataType>().unwrap(), DataType::Boolean);
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(
            "DECIMAL(10,2)".parse::<DataType>().unwrap(),
            DataType::Decimal { precision: 10, scale: 2 }
        );
        assert!("decimal(5, 10)".parse::<DataType>().is_err());
        assert!("decimal(10)".parse::<DataType>().is_err());
        assert!("decimal(10, 2".parse::<DataType>().is_err());
    }

    #[test]
    fn test_parse_unknown_type() {
        let err = "geometry".parse::<DataType>().unwrap_err();
        assert_eq!(err.to_string(), "Invalid data type 'geometry': unknown type");
    }

    #[test]
    fn test_data_type_serde_uses_canonical_names() {
        let parsed: DataType = serde_yaml::from_str("decimal(12,2)").unwrap();
        assert_eq!(parsed, DataType::Decimal { precision: 12, scale: 2 });
        assert_eq!(serde_json::to_string(&parsed).unwrap(), "\"decimal(12, 2)\"");
        assert_eq!(serde_json::to_string(&DataType::Integer).unwrap(), "\"integer\"");
        assert!(serde_yaml::from_str::<DataType>("geometry").is_err());
    }

    #[test]
    fn test_parse_aggregation() {
        assert_eq!("SUM".parse::<Aggregation>().unwrap(), Aggregation::Sum);
        assert_eq!("average".parse::<Aggregation>().unwrap(), Aggregation::Avg);
        assert_eq!("distinct_count".parse::<Aggregation>().unwrap(), Aggregation::CountDistinct);
        assert!("median".parse::<Aggregation>().is_err());
    }

    #[test]
    fn test_aggregation_sql_name() {
        assert_eq!(Aggregation::default().sql_name(), "SUM");
        assert_eq!(Aggregation::CountDistinct.sql_name(), "COUNT");
        assert!(Aggregation::CountDistinct.is_distinct());
        assert!(!Aggregation::Count.is_distinct());
    }

    #[test]
    fn test_join_kind_parse_and_mirror() {
        assert_eq!("LEFT".parse::<JoinKind>().unwrap(), JoinKind::Left);
        assert_eq!("inner".parse::<JoinKind>().unwrap(), JoinKind::Inner);
        assert!("full".parse::<JoinKind>().is_err());

        assert_eq!(JoinKind::Left.mirrored(), JoinKind::Right);
        assert_eq!(JoinKind::Right.mirrored(), JoinKind::Left);
        assert_eq!(JoinKind::Inner.mirrored(), JoinKind::Inner);
    }

    #[test]
    fn test_role_and_model_type_serde() {
        let role: DatasetRole = serde_json::from_str("\"fact\"").unwrap();
        assert_eq!(role, DatasetRole::Fact);
        let kind: ModelType = serde_json::from_str("\"snowflake\"").unwrap();
        assert_eq!(kind, ModelType::Snowflake);
    }
}
