use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Comparison operator of a filter predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterOperator {
    #[default]
    Eq,
    NotEq,
    Gt,
    Lt,
    GtEq,
    LtEq,
    /// Contains-match; the value is wrapped as `%value%`
    Like,
}

impl FilterOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Eq => "=",
            FilterOperator::NotEq => "!=",
            FilterOperator::Gt => ">",
            FilterOperator::Lt => "<",
            FilterOperator::GtEq => ">=",
            FilterOperator::LtEq => "<=",
            FilterOperator::Like => "like",
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("Unknown filter operator '{input}'. Valid options: =, !=, >, <, >=, <=, like")]
pub struct ParseFilterOperatorError {
    pub input: String,
}

impl FromStr for FilterOperator {
    type Err = ParseFilterOperatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "=" | "==" | "eq" => Ok(FilterOperator::Eq),
            "!=" | "<>" | "ne" | "neq" => Ok(FilterOperator::NotEq),
            ">" | "gt" => Ok(FilterOperator::Gt),
            "<" | "lt" => Ok(FilterOperator::Lt),
            ">=" | "gte" => Ok(FilterOperator::GtEq),
            "<=" | "lte" => Ok(FilterOperator::LtEq),
            "like" | "contains" => Ok(FilterOperator::Like),
            _ => Err(ParseFilterOperatorError { input: s.to_string() }),
        }
    }
}

impl<'de> Deserialize<'de> for FilterOperator {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        FilterOperator::from_str(&s).map_err(serde::de::Error::custom)
    }
}

impl Serialize for FilterOperator {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// Sort direction; accepts any casing on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn keyword(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl<'de> Deserialize<'de> for SortOrder {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.trim().to_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortOrder::Asc),
            "desc" | "descending" => Ok(SortOrder::Desc),
            other => Err(serde::de::Error::custom(format!(
                "Unknown sort order '{}'. Valid options: asc, desc",
                other
            ))),
        }
    }
}

impl Serialize for SortOrder {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        })
    }
}

/// A `{field, operator, value}` predicate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterPredicate {
    pub field: String,
    #[serde(default)]
    pub operator: FilterOperator,
    /// A JSON scalar; arrays and objects are rejected at resolution
    pub value: serde_json::Value,
}

impl FilterPredicate {
    pub fn new(field: impl Into<String>, operator: FilterOperator, value: impl Into<serde_json::Value>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }
}

/// Request body for pivot analysis over a model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PivotRequest {
    #[serde(alias = "data_model_id")]
    pub model_id: i64,
    #[serde(default)]
    pub dimensions: Vec<String>,
    #[serde(default)]
    pub measures: Vec<String>,
    #[serde(default)]
    pub filters: Vec<FilterPredicate>,
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub sort_order: SortOrder,
}

/// Request body for flat, paginated exploration of one dataset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdhocRequest {
    #[serde(alias = "data_set_id")]
    pub dataset_id: i64,
    /// Empty selects every declared field
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default)]
    pub filters: Vec<FilterPredicate>,
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub sort_order: SortOrder,
    #[serde(default)]
    pub limit: Option<u64>,
    #[serde(default)]
    pub offset: Option<u64>,
}
