//! Types for resolved query components

use crate::catalog::{Aggregation, DataType, DimensionDef, FieldRef, MeasureDef};
use crate::plan::{Column, ScalarValue};
use crate::query::{FilterOperator, SortOrder};

use super::graph::{Member, ModelGraph};

/// A field reference bound to the member dataset that provides it
#[derive(Debug, Clone, PartialEq)]
pub struct BoundField<'a> {
    pub field_ref: FieldRef,
    pub member: &'a Member,
}

impl<'a> BoundField<'a> {
    /// `tN.column`
    pub fn column(&self) -> Column {
        Column::new(self.member.alias.clone(), self.field_ref.column())
    }

    /// Type the member dataset declares for the column, if it declares it
    pub fn declared_type(&self) -> Option<DataType> {
        self.member
            .dataset
            .field(self.field_ref.column())
            .map(|f| f.data_type)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedDimension<'a> {
    pub def: &'a DimensionDef,
    pub field: BoundField<'a>,
    /// Suffix shared by the `dataset_`, `model_` and `pivot_` aliases
    pub output: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMeasure<'a> {
    pub def: &'a MeasureDef,
    pub field: BoundField<'a>,
    pub output: String,
}

impl<'a> ResolvedMeasure<'a> {
    pub fn aggregation(&self) -> Aggregation {
        self.def.aggregation
    }
}

/// A filter predicate on a physical column
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFilter<'a> {
    pub field: BoundField<'a>,
    pub operator: FilterOperator,
    pub value: ScalarValue,
}

/// Sort on a requested output
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSort {
    pub output: String,
    pub order: SortOrder,
}

/// A pivot request with every name bound to a physical column
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedQuery<'a> {
    pub graph: &'a ModelGraph,
    pub dimensions: Vec<ResolvedDimension<'a>>,
    pub measures: Vec<ResolvedMeasure<'a>>,
    pub filters: Vec<ResolvedFilter<'a>>,
    pub sort: Option<ResolvedSort>,
}

impl<'a> ResolvedQuery<'a> {
    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty() && self.measures.is_empty()
    }

    /// Member dataset ids that some output or filter reads from
    pub fn referenced_members(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = Vec::new();
        let fields = self
            .dimensions
            .iter()
            .map(|d| &d.field)
            .chain(self.measures.iter().map(|m| &m.field))
            .chain(self.filters.iter().map(|f| &f.field));
        for field in fields {
            let id = field.member.id();
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    }
}
