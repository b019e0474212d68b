use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::catalog::{DimensionDef, FieldRef, MeasureDef, Model};
use crate::plan::ScalarValue;
use crate::query::{FilterPredicate, PivotRequest};

use super::error::ResolveError;
use super::graph::{Member, ModelGraph};
use super::types::{
    BoundField, ResolvedDimension, ResolvedFilter, ResolvedMeasure, ResolvedQuery, ResolvedSort,
};

/// How dimension and measure references pick the dataset they read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldAnchoring {
    /// Qualified references go to the named member; bare references go to
    /// the driving dataset when it declares the column, otherwise to the
    /// first member that does.
    #[default]
    Ownership,
    /// Every reference reads from the driving dataset, declared or not.
    Driving,
}

/// Check that every requested dimension and measure is defined on the model.
///
/// Needs only the model itself, so callers can run it before loading member
/// datasets: an unknown name is reported as such, not as whatever goes wrong
/// while building the graph.
pub fn check_requested_names(model: &Model, request: &PivotRequest) -> Result<(), ResolveError> {
    lookup_definitions(model, request).map(|_| ())
}

type Definitions<'a> = (Vec<&'a DimensionDef>, Vec<&'a MeasureDef>);

fn lookup_definitions<'a>(model: &'a Model, request: &PivotRequest) -> Result<Definitions<'a>, ResolveError> {
    let dimensions = request
        .dimensions
        .iter()
        .map(|name| model.dimension(name).ok_or_else(|| ResolveError::FieldNotFound(name.clone())))
        .collect::<Result<Vec<_>, _>>()?;
    let measures = request
        .measures
        .iter()
        .map(|name| model.measure(name).ok_or_else(|| ResolveError::FieldNotFound(name.clone())))
        .collect::<Result<Vec<_>, _>>()?;
    Ok((dimensions, measures))
}

/// Resolve a pivot request against a model graph
///
/// Turns logical dimension/measure names, filter fields and the sort key
/// into references bound to member datasets. Nothing is rendered here, so
/// every naming error surfaces before any SQL exists.
pub fn resolve_pivot<'a>(
    graph: &'a ModelGraph,
    request: &PivotRequest,
    anchoring: FieldAnchoring,
) -> Result<ResolvedQuery<'a>, ResolveError> {
    // 1. Every requested name must exist before anything is bound
    let (dimension_defs, measure_defs) = lookup_definitions(&graph.model, request)?;

    // 2. Bind dimensions, then measures, in request order
    let dimensions = dimension_defs
        .into_iter()
        .map(|def| {
            let field_ref = FieldRef::for_definition(&def.name, def.field.as_deref());
            Ok(ResolvedDimension {
                def,
                field: bind_definition(graph, &def.name, field_ref, anchoring)?,
                output: output_suffix(&def.name),
            })
        })
        .collect::<Result<Vec<_>, ResolveError>>()?;

    let measures = measure_defs
        .into_iter()
        .map(|def| {
            let field_ref = FieldRef::for_definition(&def.name, def.field.as_deref());
            Ok(ResolvedMeasure {
                def,
                field: bind_definition(graph, &def.name, field_ref, anchoring)?,
                output: output_suffix(&def.name),
            })
        })
        .collect::<Result<Vec<_>, ResolveError>>()?;

    // 3. Output aliases must be unique within each layer
    check_aliases(
        dimensions
            .iter()
            .map(|d| (d.def.name.as_str(), d.output.as_str()))
            .chain(measures.iter().map(|m| (m.def.name.as_str(), m.output.as_str()))),
    )?;

    // 4. Filters
    let filters = request
        .filters
        .iter()
        .map(|f| resolve_filter(graph, f, anchoring))
        .collect::<Result<Vec<_>, ResolveError>>()?;

    // 5. Sort must name something the request outputs
    let sort = match &request.sort_by {
        Some(name) => {
            let output = dimensions
                .iter()
                .find(|d| &d.def.name == name)
                .map(|d| d.output.clone())
                .or_else(|| {
                    measures
                        .iter()
                        .find(|m| &m.def.name == name)
                        .map(|m| m.output.clone())
                })
                .ok_or_else(|| ResolveError::SortNotRequested(name.clone()))?;
            Some(ResolvedSort {
                output,
                order: request.sort_order,
            })
        }
        None => None,
    };

    Ok(ResolvedQuery {
        graph,
        dimensions,
        measures,
        filters,
        sort,
    })
}

/// Alias suffix for a logical name; dots are not valid in aliases
pub fn output_suffix(name: &str) -> String {
    name.replace('.', "_")
}

fn check_aliases<'n>(names: impl Iterator<Item = (&'n str, &'n str)>) -> Result<(), ResolveError> {
    let mut seen: HashMap<&str, &str> = HashMap::new();
    for (name, alias) in names {
        if let Some(first) = seen.insert(alias, name) {
            return Err(ResolveError::AliasCollision {
                first: first.to_string(),
                second: name.to_string(),
                alias: alias.to_string(),
            });
        }
    }
    Ok(())
}

fn bind_definition<'a>(
    graph: &'a ModelGraph,
    definition: &str,
    field_ref: FieldRef,
    anchoring: FieldAnchoring,
) -> Result<BoundField<'a>, ResolveError> {
    let member = match anchoring {
        FieldAnchoring::Driving => graph.driving(),
        FieldAnchoring::Ownership => {
            locate_owner(graph, &field_ref).ok_or_else(|| ResolveError::FieldNotOwned {
                definition: definition.to_string(),
                field: field_ref.to_string(),
            })?
        }
    };
    Ok(BoundField { field_ref, member })
}

/// Find the member that declares the referenced column
fn locate_owner<'a>(graph: &'a ModelGraph, field_ref: &FieldRef) -> Option<&'a Member> {
    let column = field_ref.column();

    if let Some(qualifier) = field_ref.qualifier() {
        if let Some(member) = graph.members().iter().find(|m| m.answers_to(qualifier)) {
            return member.dataset.owns(column).then_some(member);
        }
        // Unknown qualifier (e.g. a schema name): fall back to ownership
    }

    let driving = graph.driving();
    if driving.dataset.owns(column) {
        return Some(driving);
    }
    graph.members().iter().find(|m| m.dataset.owns(column))
}

/// Filter fields name a dimension or measure first, then a physical field.
///
/// Physical fields always resolve by ownership; there is no other way to
/// tell which member a raw column belongs to.
fn resolve_filter<'a>(
    graph: &'a ModelGraph,
    filter: &FilterPredicate,
    anchoring: FieldAnchoring,
) -> Result<ResolvedFilter<'a>, ResolveError> {
    let model = &graph.model;

    let field = if let Some(def) = model.dimension(&filter.field) {
        let field_ref = FieldRef::for_definition(&def.name, def.field.as_deref());
        bind_definition(graph, &def.name, field_ref, anchoring)?
    } else if let Some(def) = model.measure(&filter.field) {
        let field_ref = FieldRef::for_definition(&def.name, def.field.as_deref());
        bind_definition(graph, &def.name, field_ref, anchoring)?
    } else {
        let field_ref = FieldRef::parse(&filter.field);
        let member = locate_owner(graph, &field_ref)
            .ok_or_else(|| ResolveError::FieldNotFound(filter.field.clone()))?;
        BoundField { field_ref, member }
    };

    let value = ScalarValue::for_filter(&filter.value, filter.operator, field.declared_type())
        .ok_or_else(|| ResolveError::InvalidFilterValue(filter.field.clone()))?;

    Ok(ResolvedFilter {
        field,
        operator: filter.operator,
        value,
    })
}
