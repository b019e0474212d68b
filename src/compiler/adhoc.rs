//! Flat single-dataset queries with pagination and a matching count

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::catalog::{normalize_column, Dataset, DatasetRelation};
use crate::config::AdhocConfig;
use crate::plan::{AdhocPlan, Column, Expr, Page, Relation, ScalarValue, SelectItem, SelectSpec, SortKey};
use crate::query::AdhocRequest;

use super::error::CompileError;
use super::pivot::predicate;

/// Alias of the dataset's table in visual mode
pub const ADHOC_TABLE_ALIAS: &str = "t1";
/// Alias of the wrapped stored query in sql mode
pub const ADHOC_QUERY_ALIAS: &str = "adhoc_query";
/// Output column of the count query
pub const TOTAL_COLUMN: &str = "total";

/// Build the row query and count query for an ad-hoc request.
///
/// Requested, filtered and sorted fields must be declared on the dataset.
/// In sql mode the stored query decides the projection and order; only the
/// filters and pagination apply on top of it.
pub fn compile_adhoc(
    dataset: &Dataset,
    request: &AdhocRequest,
    limits: &AdhocConfig,
) -> Result<AdhocPlan, CompileError> {
    // 1. Validate names against the declared field list
    let mut requested: Vec<String> = Vec::with_capacity(request.fields.len());
    let mut seen: HashMap<&str, &str> = HashMap::new();
    for name in &request.fields {
        let column = dataset
            .field(name)
            .map(|f| f.column())
            .ok_or_else(|| CompileError::FieldNotFound(name.clone()))?;
        if let Some(first) = seen.insert(column, name) {
            return Err(CompileError::AliasCollision {
                first: first.to_string(),
                second: name.clone(),
                alias: column.to_string(),
            });
        }
        requested.push(column.to_string());
    }

    for filter in &request.filters {
        if dataset.field(&filter.field).is_none() {
            return Err(CompileError::FieldNotFound(filter.field.clone()));
        }
    }

    if let Some(sort) = &request.sort_by {
        if dataset.field(sort).is_none() {
            return Err(CompileError::FieldNotFound(sort.clone()));
        }
    }

    // 2. Pagination
    let limit = request.limit.unwrap_or(limits.default_limit);
    if limit == 0 {
        return Err(CompileError::InvalidLimit);
    }
    let capped_from = (limit > limits.max_limit).then_some(limit);
    if capped_from.is_some() {
        warn!(
            dataset = %dataset.name,
            requested = limit,
            applied = limits.max_limit,
            "ad-hoc limit capped"
        );
    }
    let page = Page {
        limit: limit.min(limits.max_limit),
        offset: request.offset.unwrap_or(0),
    };

    let (from, alias) = match dataset.relation() {
        DatasetRelation::Table(name) => (Relation::table(name, ADHOC_TABLE_ALIAS), ADHOC_TABLE_ALIAS),
        DatasetRelation::Query(sql) => (Relation::query(sql, ADHOC_QUERY_ALIAS), ADHOC_QUERY_ALIAS),
    };

    // 3. Shared predicate, so the count matches the rows it counts
    let predicates = request
        .filters
        .iter()
        .map(|f| {
            let declared = dataset.field(&f.field).map(|def| def.data_type);
            let value = ScalarValue::for_filter(&f.value, f.operator, declared)
                .ok_or_else(|| CompileError::InvalidFilterValue(f.field.clone()))?;
            let column = Column::new(alias, normalize_column(&f.field));
            Ok(predicate(column, f.operator, &value))
        })
        .collect::<Result<Vec<_>, CompileError>>()?;
    let filter = Expr::conjunction(predicates);

    let count = SelectSpec::new(from.clone())
        .with_items(vec![SelectItem::aliased(Expr::CountAll, TOTAL_COLUMN)])
        .with_filter(filter.clone());

    // 4. Row query
    let (items, columns, order_by) = if dataset.is_sql_mode() {
        (vec![SelectItem::bare(Expr::Wildcard)], None, vec![])
    } else {
        let columns: Vec<String> = if requested.is_empty() {
            dataset.fields.iter().map(|f| f.column().to_string()).collect()
        } else {
            requested
        };
        let order_by: Vec<SortKey> = request
            .sort_by
            .iter()
            .map(|sort| SortKey {
                expr: Expr::column(alias, normalize_column(sort)),
                order: request.sort_order,
            })
            .collect();

        if columns.is_empty() {
            // Nothing declared: let the table decide
            (vec![SelectItem::bare(Expr::Wildcard)], None, order_by)
        } else {
            let items = columns
                .iter()
                .map(|c| SelectItem::aliased(Expr::column(alias, c.as_str()), c.as_str()))
                .collect();
            (items, Some(columns), order_by)
        }
    };

    let rows = SelectSpec::new(from)
        .with_items(items)
        .with_filter(filter)
        .with_order_by(order_by)
        .with_page(Some(page));

    debug!(
        dataset = %dataset.name,
        limit = page.limit,
        offset = page.offset,
        "compiled ad-hoc plan"
    );

    Ok(AdhocPlan {
        rows,
        count,
        columns,
        capped_from,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::BinaryOperator;
    use crate::query::{FilterOperator, FilterPredicate, SortOrder};
    use serde_json::json;

    fn visual_dataset() -> Dataset {
        serde_yaml::from_str(
            r#"
id: 5
name: orders
data_source_id: 1
creation_mode: visual
visual_config: { tables: [sales.orders] }
fields:
  - { name: orders.id, type: int }
  - { name: region, type: string }
  - { name: amount, type: number }
"#,
        )
        .unwrap()
    }

    fn sql_dataset() -> Dataset {
        serde_yaml::from_str(
            r#"
id: 6
name: big_orders
data_source_id: 1
creation_mode: sql
sql_query: "SELECT id, amount FROM orders WHERE amount > 1000"
fields:
  - { name: id, type: int }
  - { name: amount, type: number }
"#,
        )
        .unwrap()
    }

    fn request(fields: &[&str]) -> AdhocRequest {
        AdhocRequest {
            dataset_id: 5,
            fields: fields.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults_to_all_declared_fields() {
        let plan = compile_adhoc(&visual_dataset(), &request(&[]), &AdhocConfig::default()).unwrap();
        assert_eq!(
            plan.columns,
            Some(vec!["id".to_string(), "region".to_string(), "amount".to_string()])
        );
        assert_eq!(plan.rows.page, Some(Page { limit: 1000, offset: 0 }));
        assert_eq!(plan.rows.from, Relation::table("sales.orders", "t1"));
    }

    #[test]
    fn test_requested_fields_are_normalized() {
        let plan = compile_adhoc(&visual_dataset(), &request(&["orders.id", "amount"]), &AdhocConfig::default()).unwrap();
        assert_eq!(plan.rows.output_names(), vec!["id", "amount"]);
    }

    #[test]
    fn test_fields_naming_the_same_column_collide() {
        let err = compile_adhoc(&visual_dataset(), &request(&["amount", "orders.amount"]), &AdhocConfig::default())
            .unwrap_err();
        match err {
            CompileError::AliasCollision { first, second, alias } => {
                assert_eq!((first.as_str(), second.as_str(), alias.as_str()), ("amount", "orders.amount", "amount"));
            }
            other => panic!("expected AliasCollision, got {other:?}"),
        }

        let err = compile_adhoc(&visual_dataset(), &request(&["region", "region"]), &AdhocConfig::default())
            .unwrap_err();
        assert!(matches!(err, CompileError::AliasCollision { .. }));
    }

    #[test]
    fn test_filter_text_becomes_number_for_numeric_fields() {
        let mut req = request(&["region"]);
        req.filters = vec![
            FilterPredicate::new("amount", FilterOperator::Gt, json!("100")),
            FilterPredicate::new("region", FilterOperator::Eq, json!(7)),
        ];
        let plan = compile_adhoc(&visual_dataset(), &req, &AdhocConfig::default()).unwrap();

        assert_eq!(
            plan.rows.filter,
            Some(Expr::And(vec![
                Expr::binary(Expr::column("t1", "amount"), BinaryOperator::Gt, Expr::Param(ScalarValue::Int(100))),
                Expr::binary(
                    Expr::column("t1", "region"),
                    BinaryOperator::Eq,
                    Expr::Param(ScalarValue::Text("7".into()))
                ),
            ]))
        );

        req.filters = vec![FilterPredicate::new("amount", FilterOperator::Gt, json!("a lot"))];
        let err = compile_adhoc(&visual_dataset(), &req, &AdhocConfig::default()).unwrap_err();
        assert!(matches!(err, CompileError::InvalidFilterValue(ref f) if f == "amount"));
    }

    #[test]
    fn test_null_equality_filter() {
        let mut req = request(&["region"]);
        req.filters = vec![FilterPredicate::new("region", FilterOperator::Eq, json!(null))];
        let plan = compile_adhoc(&visual_dataset(), &req, &AdhocConfig::default()).unwrap();
        assert_eq!(plan.count.filter, Some(Expr::is_null(Expr::column("t1", "region"), false)));

        req.filters = vec![FilterPredicate::new("amount", FilterOperator::GtEq, json!(null))];
        assert!(matches!(
            compile_adhoc(&visual_dataset(), &req, &AdhocConfig::default()),
            Err(CompileError::InvalidFilterValue(_))
        ));
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let err = compile_adhoc(&visual_dataset(), &request(&["discount"]), &AdhocConfig::default()).unwrap_err();
        assert!(matches!(err, CompileError::FieldNotFound(ref f) if f == "discount"));
    }

    #[test]
    fn test_count_shares_predicate_without_pagination() {
        let mut req = request(&["region"]);
        req.filters = vec![FilterPredicate::new("amount", FilterOperator::Gt, json!(100))];
        req.sort_by = Some("amount".into());
        req.sort_order = SortOrder::Desc;
        req.limit = Some(20);
        req.offset = Some(40);

        let plan = compile_adhoc(&visual_dataset(), &req, &AdhocConfig::default()).unwrap();
        assert_eq!(plan.rows.page, Some(Page { limit: 20, offset: 40 }));
        assert_eq!(plan.count.page, None);
        assert!(plan.count.order_by.is_empty());
        assert_eq!(plan.count.filter, plan.rows.filter);
        assert_eq!(
            plan.rows.filter,
            Some(Expr::binary(
                Expr::column("t1", "amount"),
                BinaryOperator::Gt,
                Expr::Param(ScalarValue::Int(100))
            ))
        );
        assert_eq!(plan.count.output_names(), vec![TOTAL_COLUMN]);
    }

    #[test]
    fn test_limit_is_capped() {
        let mut req = request(&[]);
        req.limit = Some(1_000_000);
        let plan = compile_adhoc(&visual_dataset(), &req, &AdhocConfig::default()).unwrap();
        assert_eq!(plan.rows.page.map(|p| p.limit), Some(10_000));
        assert_eq!(plan.capped_from, Some(1_000_000));

        req.limit = Some(10_000);
        let plan = compile_adhoc(&visual_dataset(), &req, &AdhocConfig::default()).unwrap();
        assert_eq!(plan.capped_from, None);

        req.limit = Some(0);
        assert!(matches!(
            compile_adhoc(&visual_dataset(), &req, &AdhocConfig::default()),
            Err(CompileError::InvalidLimit)
        ));
    }

    #[test]
    fn test_sql_mode_wraps_stored_query() {
        let mut req = request(&["amount"]);
        req.filters = vec![FilterPredicate::new("amount", FilterOperator::LtEq, json!(5000))];
        req.sort_by = Some("amount".into());
        let plan = compile_adhoc(&sql_dataset(), &req, &AdhocConfig::default()).unwrap();

        assert_eq!(
            plan.rows.from,
            Relation::query("SELECT id, amount FROM orders WHERE amount > 1000", ADHOC_QUERY_ALIAS)
        );
        assert_eq!(plan.rows.items, vec![SelectItem::bare(Expr::Wildcard)]);
        assert_eq!(plan.columns, None);
        // Stored query keeps its own order
        assert!(plan.rows.order_by.is_empty());
        assert!(plan.rows.filter.is_some());
    }
}
