//! Three-layer pivot plan
//!
//! ```text
//! pivot layer    SELECT model_x AS pivot_x ... FROM (...) model_query ORDER BY pivot_s
//! model layer    SELECT dataset_x AS model_x ... FROM (...) dataset_query
//! dataset layer  SELECT t1.col AS dataset_x, SUM(t2.col) AS dataset_y
//!                FROM driving t1 JOIN ... WHERE ... GROUP BY t1.col
//! ```

use tracing::debug;

use crate::plan::{
    BinaryOperator, Column, Expr, Plan, Relation, ScalarValue, SelectItem, SelectSpec, SortKey,
};
use crate::query::FilterOperator;
use crate::resolver::{ResolvedFilter, ResolvedQuery};

use super::error::CompileError;
use super::joins::plan_joins;

pub const DATASET_PREFIX: &str = "dataset_";
pub const MODEL_PREFIX: &str = "model_";
pub const PIVOT_PREFIX: &str = "pivot_";

pub const DATASET_QUERY_ALIAS: &str = "dataset_query";
pub const MODEL_QUERY_ALIAS: &str = "model_query";

/// Build the pivot plan for a resolved request.
///
/// Pure function of its input: compiling the same request against the same
/// model always yields an identical plan.
pub fn compile_pivot(resolved: &ResolvedQuery<'_>) -> Result<Plan, CompileError> {
    if resolved.is_empty() {
        return Err(CompileError::EmptyQuery);
    }

    let (from, joins) = plan_joins(resolved.graph, &resolved.referenced_members())?;

    // Outputs in request order: dimensions then measures
    let outputs: Vec<&str> = resolved
        .dimensions
        .iter()
        .map(|d| d.output.as_str())
        .chain(resolved.measures.iter().map(|m| m.output.as_str()))
        .collect();

    // ------------------------------------------------------------------
    // Dataset layer
    // ------------------------------------------------------------------
    let mut items = Vec::with_capacity(outputs.len());
    let mut group_by = Vec::with_capacity(resolved.dimensions.len());

    for dim in &resolved.dimensions {
        let expr = Expr::Column(dim.field.column());
        items.push(SelectItem::aliased(expr.clone(), prefixed(DATASET_PREFIX, &dim.output)));
        group_by.push(expr);
    }
    for measure in &resolved.measures {
        let expr = Expr::aggregate(measure.aggregation(), Expr::Column(measure.field.column()));
        items.push(SelectItem::aliased(expr, prefixed(DATASET_PREFIX, &measure.output)));
    }

    let predicates = resolved.filters.iter().map(filter_expr).collect();

    let base = SelectSpec::new(from)
        .with_items(items)
        .with_joins(joins)
        .with_filter(Expr::conjunction(predicates))
        .with_group_by(group_by);

    // ------------------------------------------------------------------
    // Model layer
    // ------------------------------------------------------------------
    let model = SelectSpec::new(Relation::derived(base, DATASET_QUERY_ALIAS))
        .with_items(rename_layer(&outputs, DATASET_PREFIX, MODEL_PREFIX));

    // ------------------------------------------------------------------
    // Pivot layer
    // ------------------------------------------------------------------
    let order_by = resolved
        .sort
        .iter()
        .map(|sort| SortKey {
            expr: Expr::Column(Column::unqualified(prefixed(PIVOT_PREFIX, &sort.output))),
            order: sort.order,
        })
        .collect();

    let root = SelectSpec::new(Relation::derived(model, MODEL_QUERY_ALIAS))
        .with_items(rename_layer(&outputs, MODEL_PREFIX, PIVOT_PREFIX))
        .with_order_by(order_by);

    let columns = outputs.iter().map(|o| prefixed(PIVOT_PREFIX, o)).collect();

    debug!(
        model = %resolved.graph.model.name,
        dimensions = resolved.dimensions.len(),
        measures = resolved.measures.len(),
        filters = resolved.filters.len(),
        "compiled pivot plan"
    );

    Ok(Plan { root, columns })
}

fn prefixed(prefix: &str, output: &str) -> String {
    format!("{}{}", prefix, output)
}

fn rename_layer(outputs: &[&str], from: &str, to: &str) -> Vec<SelectItem> {
    outputs
        .iter()
        .map(|o| {
            SelectItem::aliased(
                Expr::Column(Column::unqualified(prefixed(from, o))),
                prefixed(to, o),
            )
        })
        .collect()
}

fn filter_expr(filter: &ResolvedFilter<'_>) -> Expr {
    predicate(filter.field.column(), filter.operator, &filter.value)
}

/// `column <op> ?`, with like values wrapped for a contains-match.
///
/// A null literal never becomes a parameter: `=`/`!=` null is a null test.
pub(crate) fn predicate(column: Column, operator: FilterOperator, value: &ScalarValue) -> Expr {
    let value = match (operator, value) {
        (FilterOperator::Eq, ScalarValue::Null) => return Expr::is_null(Expr::Column(column), false),
        (FilterOperator::NotEq, ScalarValue::Null) => return Expr::is_null(Expr::Column(column), true),
        (FilterOperator::Like, value) => value.contains_pattern(),
        (_, value) => value.clone(),
    };
    Expr::binary(Expr::Column(column), BinaryOperator::from(operator), Expr::Param(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Aggregation, Dataset, Model};
    use crate::query::{FilterPredicate, PivotRequest, SortOrder};
    use crate::resolver::{resolve_pivot, FieldAnchoring, ModelGraph};
    use serde_json::json;

    fn orders_graph() -> ModelGraph {
        let datasets: Vec<Dataset> = serde_yaml::from_str(
            r#"
- id: 1
  name: orders
  data_source_id: 1
  creation_mode: visual
  visual_config: { tables: [orders] }
  fields: [{ name: region, type: string }, { name: amount, type: number }]
"#,
        )
        .unwrap();
        let model: Model = serde_yaml::from_str(
            r#"
id: 1
name: sales
data_sets: [{ data_set_id: 1, role: fact }]
dimensions: [{ name: region }]
measures: [{ name: revenue, field: amount, aggregation: SUM }, { name: orders, field: amount, aggregation: count }]
"#,
        )
        .unwrap();
        ModelGraph::new(model, datasets).unwrap()
    }

    fn compile(graph: &ModelGraph, request: &PivotRequest) -> Result<Plan, CompileError> {
        let resolved = resolve_pivot(graph, request, FieldAnchoring::Ownership).unwrap();
        compile_pivot(&resolved)
    }

    fn request(dims: &[&str], measures: &[&str]) -> PivotRequest {
        PivotRequest {
            model_id: 1,
            dimensions: dims.iter().map(|s| s.to_string()).collect(),
            measures: measures.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_three_layers() {
        let g = orders_graph();
        let plan = compile(&g, &request(&["region"], &["revenue"])).unwrap();

        let layers = plan.layers();
        assert_eq!(layers.len(), 3);
        assert_eq!(layers[0].output_names(), vec!["pivot_region", "pivot_revenue"]);
        assert_eq!(layers[1].output_names(), vec!["model_region", "model_revenue"]);
        assert_eq!(layers[2].output_names(), vec!["dataset_region", "dataset_revenue"]);
        assert_eq!(layers[0].from.alias(), MODEL_QUERY_ALIAS);
        assert_eq!(layers[1].from.alias(), DATASET_QUERY_ALIAS);
        assert_eq!(plan.output_columns(), &["pivot_region".to_string(), "pivot_revenue".to_string()]);
    }

    #[test]
    fn test_base_layer_aggregates_and_groups() {
        let g = orders_graph();
        let plan = compile(&g, &request(&["region"], &["revenue", "orders"])).unwrap();
        let base = plan.base();

        assert_eq!(base.from, Relation::table("orders", "t1"));
        assert_eq!(base.group_by, vec![Expr::column("t1", "region")]);
        assert_eq!(
            base.items[1].expr,
            Expr::aggregate(Aggregation::Sum, Expr::column("t1", "amount"))
        );
        assert_eq!(
            base.items[2].expr,
            Expr::aggregate(Aggregation::Count, Expr::column("t1", "amount"))
        );
    }

    #[test]
    fn test_measures_only_has_no_group_by() {
        let g = orders_graph();
        let plan = compile(&g, &request(&[], &["revenue"])).unwrap();
        assert!(plan.base().group_by.is_empty());
    }

    #[test]
    fn test_empty_request() {
        let g = orders_graph();
        let err = compile(&g, &request(&[], &[])).unwrap_err();
        assert!(matches!(err, CompileError::EmptyQuery));
    }

    #[test]
    fn test_filters_become_bound_params() {
        let g = orders_graph();
        let mut req = request(&["region"], &["revenue"]);
        req.filters = vec![
            FilterPredicate::new("amount", FilterOperator::Gt, json!(100)),
            FilterPredicate::new("region", FilterOperator::Like, json!("north")),
        ];
        let plan = compile(&g, &req).unwrap();

        let Some(Expr::And(predicates)) = &plan.base().filter else {
            panic!("expected a conjunction, got {:?}", plan.base().filter);
        };
        assert_eq!(
            predicates[0],
            Expr::binary(
                Expr::column("t1", "amount"),
                BinaryOperator::Gt,
                Expr::Param(ScalarValue::Int(100))
            )
        );
        assert_eq!(
            predicates[1],
            Expr::binary(
                Expr::column("t1", "region"),
                BinaryOperator::Like,
                Expr::Param(ScalarValue::Text("%north%".into()))
            )
        );
    }

    #[test]
    fn test_null_filter_is_a_null_test() {
        let g = orders_graph();
        let mut req = request(&["region"], &["revenue"]);
        req.filters = vec![
            FilterPredicate::new("region", FilterOperator::Eq, json!(null)),
            FilterPredicate::new("amount", FilterOperator::NotEq, json!(null)),
        ];
        let plan = compile(&g, &req).unwrap();

        assert_eq!(
            plan.base().filter,
            Some(Expr::And(vec![
                Expr::is_null(Expr::column("t1", "region"), false),
                Expr::is_null(Expr::column("t1", "amount"), true),
            ]))
        );
    }

    #[test]
    fn test_sort_maps_to_pivot_alias() {
        let g = orders_graph();
        let mut req = request(&["region"], &["revenue"]);
        req.sort_by = Some("revenue".into());
        req.sort_order = SortOrder::Desc;
        let plan = compile(&g, &req).unwrap();

        assert_eq!(
            plan.root.order_by,
            vec![SortKey {
                expr: Expr::Column(Column::unqualified("pivot_revenue")),
                order: SortOrder::Desc,
            }]
        );
        // Only the outermost layer sorts
        assert!(plan.base().order_by.is_empty());
    }

    #[test]
    fn test_compilation_is_deterministic() {
        let g = orders_graph();
        let req = request(&["region"], &["revenue", "orders"]);
        assert_eq!(compile(&g, &req).unwrap(), compile(&g, &req).unwrap());
    }
}
