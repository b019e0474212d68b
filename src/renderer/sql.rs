//! SQL renderer
//!
//! Transforms a SelectSpec tree into dialect-specific query text plus the
//! parameter list its placeholders refer to.

use crate::plan::{Expr, Join, Page, Plan, Relation, ScalarValue, SelectItem, SelectSpec, SortKey};

use super::dialect::{Dialect, Pagination};
use super::error::RenderError;

/// Query text ready to hand to a backend
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedQuery {
    pub sql: String,
    /// Bound values, in placeholder order
    pub params: Vec<ScalarValue>,
    pub dialect: Dialect,
}

/// Turns plans into query text
pub trait Render: Send + Sync {
    fn render(&self, dialect: Dialect, select: &SelectSpec) -> Result<RenderedQuery, RenderError>;

    fn render_plan(&self, dialect: Dialect, plan: &Plan) -> Result<RenderedQuery, RenderError> {
        self.render(dialect, &plan.root)
    }
}

/// The standard renderer: single-line SQL, every identifier quoted, every
/// value bound.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlRenderer;

impl Render for SqlRenderer {
    fn render(&self, dialect: Dialect, select: &SelectSpec) -> Result<RenderedQuery, RenderError> {
        let mut writer = Writer {
            dialect,
            params: Vec::new(),
        };
        let sql = writer.select(select)?;
        Ok(RenderedQuery {
            sql,
            params: writer.params,
            dialect,
        })
    }
}

/// Accumulates parameters as placeholders are written, so parameter order
/// always matches text order.
struct Writer {
    dialect: Dialect,
    params: Vec<ScalarValue>,
}

impl Writer {
    // ---------------------------------------------------------------------------
    // Statements
    // ---------------------------------------------------------------------------

    fn select(&mut self, select: &SelectSpec) -> Result<String, RenderError> {
        if select.items.is_empty() {
            return Err(RenderError::InvalidPlan("SELECT without output columns".to_string()));
        }

        let items = select
            .items
            .iter()
            .map(|item| self.select_item(item))
            .collect::<Result<Vec<_>, _>>()?;
        let mut sql = format!("SELECT {} FROM {}", items.join(", "), self.relation(&select.from)?);

        for join in &select.joins {
            sql.push(' ');
            sql.push_str(&self.join(join)?);
        }

        if let Some(filter) = &select.filter {
            sql.push_str(" WHERE ");
            sql.push_str(&self.expr(filter)?);
        }

        if !select.group_by.is_empty() {
            let keys = select
                .group_by
                .iter()
                .map(|e| self.expr(e))
                .collect::<Result<Vec<_>, _>>()?;
            sql.push_str(" GROUP BY ");
            sql.push_str(&keys.join(", "));
        }

        if !select.order_by.is_empty() {
            let keys = select
                .order_by
                .iter()
                .map(|k| self.sort_key(k))
                .collect::<Result<Vec<_>, _>>()?;
            sql.push_str(" ORDER BY ");
            sql.push_str(&keys.join(", "));
        }

        if let Some(page) = &select.page {
            sql.push_str(&self.page(page, !select.order_by.is_empty()));
        }

        Ok(sql)
    }

    fn select_item(&mut self, item: &SelectItem) -> Result<String, RenderError> {
        let expr = self.expr(&item.expr)?;
        Ok(match &item.alias {
            Some(alias) => format!("{} AS {}", expr, self.dialect.quote_ident(alias)),
            None => expr,
        })
    }

    fn sort_key(&mut self, key: &SortKey) -> Result<String, RenderError> {
        Ok(format!("{} {}", self.expr(&key.expr)?, key.order.keyword()))
    }

    fn page(&self, page: &Page, ordered: bool) -> String {
        match self.dialect.spec().pagination {
            Pagination::LimitOffset => format!(" LIMIT {} OFFSET {}", page.limit, page.offset),
            Pagination::OffsetFetch { requires_order } => {
                let order = if requires_order && !ordered {
                    " ORDER BY (SELECT NULL)"
                } else {
                    ""
                };
                format!(
                    "{} OFFSET {} ROWS FETCH NEXT {} ROWS ONLY",
                    order, page.offset, page.limit
                )
            }
        }
    }

    // ---------------------------------------------------------------------------
    // Relations
    // ---------------------------------------------------------------------------

    /// Table aliases are written without AS, which every dialect accepts
    fn relation(&mut self, relation: &Relation) -> Result<String, RenderError> {
        match relation {
            Relation::Table { name, alias } => Ok(format!(
                "{} {}",
                self.dialect.quote_table(name),
                self.dialect.quote_ident(alias)
            )),
            Relation::Query { sql, alias } => Ok(format!(
                "({}) {}",
                stored_query_text(sql)?,
                self.dialect.quote_ident(alias)
            )),
            Relation::Derived { input, alias } => Ok(format!(
                "({}) {}",
                self.select(input)?,
                self.dialect.quote_ident(alias)
            )),
        }
    }

    fn join(&mut self, join: &Join) -> Result<String, RenderError> {
        if join.on.is_empty() {
            return Err(RenderError::InvalidPlan(format!(
                "join to '{}' has no join condition",
                join.relation.alias()
            )));
        }
        let relation = self.relation(&join.relation)?;
        let conditions = join
            .on
            .iter()
            .map(|(left, right)| {
                format!(
                    "{} = {}",
                    self.column(left),
                    self.column(right)
                )
            })
            .collect::<Vec<_>>();
        Ok(format!("{} {} ON {}", join.kind.keyword(), relation, conditions.join(" AND ")))
    }

    // ---------------------------------------------------------------------------
    // Expressions
    // ---------------------------------------------------------------------------

    fn expr(&mut self, expr: &Expr) -> Result<String, RenderError> {
        match expr {
            Expr::Column(column) => Ok(self.column(column)),
            Expr::Param(value) => {
                self.params.push(value.clone());
                Ok(self.dialect.placeholder(self.params.len()))
            }
            Expr::Aggregate { func, arg } => {
                let arg = self.expr(arg)?;
                if func.is_distinct() {
                    Ok(format!("{}(DISTINCT {})", func.sql_name(), arg))
                } else {
                    Ok(format!("{}({})", func.sql_name(), arg))
                }
            }
            Expr::CountAll => Ok("COUNT(*)".to_string()),
            Expr::Wildcard => Ok("*".to_string()),
            Expr::BinaryOp { left, op, right } => {
                let left = self.expr(left)?;
                let right = self.expr(right)?;
                Ok(format!("{} {} {}", left, op.as_str(), right))
            }
            Expr::IsNull { expr, negated } => {
                let operand = self.expr(expr)?;
                let test = if *negated { "IS NOT NULL" } else { "IS NULL" };
                Ok(format!("{} {}", operand, test))
            }
            Expr::And(items) => {
                if items.is_empty() {
                    return Err(RenderError::InvalidPlan("empty AND".to_string()));
                }
                let parts = items
                    .iter()
                    .map(|e| {
                        let sql = self.expr(e)?;
                        Ok(match e {
                            Expr::And(_) => format!("({})", sql),
                            _ => sql,
                        })
                    })
                    .collect::<Result<Vec<_>, RenderError>>()?;
                Ok(parts.join(" AND "))
            }
        }
    }

    fn column(&self, column: &crate::plan::Column) -> String {
        if column.is_qualified() {
            format!(
                "{}.{}",
                self.dialect.quote_ident(&column.table),
                self.dialect.quote_ident(&column.name)
            )
        } else {
            self.dialect.quote_ident(&column.name)
        }
    }
}

/// Stored query text without trailing terminators, so it can be nested
fn stored_query_text(sql: &str) -> Result<&str, RenderError> {
    let text = sql.trim().trim_end_matches(';').trim_end();
    if text.is_empty() {
        return Err(RenderError::InvalidPlan("stored query is empty".to_string()));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Aggregation, JoinKind};
    use crate::plan::{BinaryOperator, Column};
    use crate::query::SortOrder;
    use pretty_assertions::assert_eq;

    fn orders_base() -> SelectSpec {
        SelectSpec::new(Relation::table("orders", "t1"))
            .with_items(vec![
                SelectItem::aliased(Expr::column("t1", "region"), "dataset_region"),
                SelectItem::aliased(
                    Expr::aggregate(Aggregation::Sum, Expr::column("t1", "amount")),
                    "dataset_revenue",
                ),
            ])
            .with_group_by(vec![Expr::column("t1", "region")])
    }

    #[test]
    fn test_base_layer_mysql() {
        let rendered = SqlRenderer.render(Dialect::MySql, &orders_base()).unwrap();
        assert_eq!(
            rendered.sql,
            "SELECT `t1`.`region` AS `dataset_region`, SUM(`t1`.`amount`) AS `dataset_revenue` \
             FROM `orders` `t1` GROUP BY `t1`.`region`"
        );
        assert!(rendered.params.is_empty());
    }

    #[test]
    fn test_params_follow_text_order() {
        let filter = Expr::And(vec![
            Expr::binary(Expr::column("t1", "amount"), BinaryOperator::Gt, Expr::Param(ScalarValue::Int(100))),
            Expr::binary(Expr::column("t1", "region"), BinaryOperator::Eq, Expr::Param(ScalarValue::Text("EU".into()))),
        ]);
        let select = orders_base().with_filter(Some(filter));

        let pg = SqlRenderer.render(Dialect::Postgres, &select).unwrap();
        assert!(pg.sql.contains(r#"WHERE "t1"."amount" > $1 AND "t1"."region" = $2"#), "{}", pg.sql);
        assert_eq!(pg.params, vec![ScalarValue::Int(100), ScalarValue::Text("EU".into())]);

        let ora = SqlRenderer.render(Dialect::Oracle, &select).unwrap();
        assert!(ora.sql.contains(":1") && ora.sql.contains(":2"), "{}", ora.sql);
    }

    #[test]
    fn test_null_tests_bind_nothing() {
        let filter = Expr::And(vec![
            Expr::is_null(Expr::column("t1", "region"), false),
            Expr::binary(Expr::column("t1", "amount"), BinaryOperator::Gt, Expr::Param(ScalarValue::Int(5))),
            Expr::is_null(Expr::column("t1", "amount"), true),
        ]);
        let select = orders_base().with_filter(Some(filter));

        let pg = SqlRenderer.render(Dialect::Postgres, &select).unwrap();
        assert!(
            pg.sql.contains(r#"WHERE "t1"."region" IS NULL AND "t1"."amount" > $1 AND "t1"."amount" IS NOT NULL"#),
            "{}",
            pg.sql
        );
        assert_eq!(pg.params, vec![ScalarValue::Int(5)]);
    }

    #[test]
    fn test_joins_render_kind_and_conditions() {
        let select = orders_base().with_joins(vec![Join {
            kind: JoinKind::Left,
            relation: Relation::table("crm.customers", "t2"),
            on: vec![
                (Column::new("t1", "customer_id"), Column::new("t2", "id")),
                (Column::new("t1", "tenant"), Column::new("t2", "tenant")),
            ],
        }]);
        let rendered = SqlRenderer.render(Dialect::SqlServer, &select).unwrap();
        assert!(
            rendered.sql.contains(
                "FROM [orders] [t1] LEFT JOIN [crm].[customers] [t2] ON [t1].[customer_id] = [t2].[id] AND [t1].[tenant] = [t2].[tenant]"
            ),
            "{}",
            rendered.sql
        );
    }

    #[test]
    fn test_stored_query_is_nested_without_terminator() {
        let select = SelectSpec::new(Relation::query("SELECT * FROM orders;  ", "adhoc_query"))
            .with_items(vec![SelectItem::bare(Expr::Wildcard)]);
        let rendered = SqlRenderer.render(Dialect::Sqlite, &select).unwrap();
        assert_eq!(rendered.sql, r#"SELECT * FROM (SELECT * FROM orders) "adhoc_query""#);
    }

    #[test]
    fn test_pagination_per_dialect() {
        let page = Some(Page { limit: 20, offset: 40 });
        let select = SelectSpec::new(Relation::table("orders", "t1"))
            .with_items(vec![SelectItem::bare(Expr::Wildcard)])
            .with_page(page);

        let mysql = SqlRenderer.render(Dialect::MySql, &select).unwrap();
        assert!(mysql.sql.ends_with("LIMIT 20 OFFSET 40"), "{}", mysql.sql);

        let oracle = SqlRenderer.render(Dialect::Oracle, &select).unwrap();
        assert!(oracle.sql.ends_with("OFFSET 40 ROWS FETCH NEXT 20 ROWS ONLY"), "{}", oracle.sql);
        assert!(!oracle.sql.contains("ORDER BY"));

        let mssql = SqlRenderer.render(Dialect::SqlServer, &select).unwrap();
        assert!(
            mssql.sql.ends_with("ORDER BY (SELECT NULL) OFFSET 40 ROWS FETCH NEXT 20 ROWS ONLY"),
            "{}",
            mssql.sql
        );

        let sorted = select.clone().with_order_by(vec![SortKey {
            expr: Expr::column("t1", "amount"),
            order: SortOrder::Desc,
        }]);
        let mssql = SqlRenderer.render(Dialect::SqlServer, &sorted).unwrap();
        assert!(
            mssql.sql.ends_with("ORDER BY [t1].[amount] DESC OFFSET 40 ROWS FETCH NEXT 20 ROWS ONLY"),
            "{}",
            mssql.sql
        );
    }

    #[test]
    fn test_count_distinct() {
        let select = SelectSpec::new(Relation::table("orders", "t1")).with_items(vec![SelectItem::aliased(
            Expr::aggregate(Aggregation::CountDistinct, Expr::column("t1", "customer_id")),
            "buyers",
        )]);
        let rendered = SqlRenderer.render(Dialect::Postgres, &select).unwrap();
        assert_eq!(
            rendered.sql,
            r#"SELECT COUNT(DISTINCT "t1"."customer_id") AS "buyers" FROM "orders" "t1""#
        );
    }

    #[test]
    fn test_select_without_items_is_invalid() {
        let select = SelectSpec::new(Relation::table("orders", "t1"));
        assert!(matches!(
            SqlRenderer.render(Dialect::MySql, &select),
            Err(RenderError::InvalidPlan(_))
        ));
    }
}
