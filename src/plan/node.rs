//! Plan node types

use crate::catalog::JoinKind;
use crate::query::SortOrder;

use super::expr::{Column, Expr};

/// Something a SELECT reads from
#[derive(Debug, Clone, PartialEq)]
pub enum Relation {
    /// Physical table (`schema.table` allowed)
    Table { name: String, alias: String },
    /// Stored query text wrapped as a derived table
    Query { sql: String, alias: String },
    /// A nested plan layer
    Derived { input: Box<SelectSpec>, alias: String },
}

impl Relation {
    pub fn table(name: impl Into<String>, alias: impl Into<String>) -> Self {
        Relation::Table {
            name: name.into(),
            alias: alias.into(),
        }
    }

    pub fn query(sql: impl Into<String>, alias: impl Into<String>) -> Self {
        Relation::Query {
            sql: sql.into(),
            alias: alias.into(),
        }
    }

    pub fn derived(input: SelectSpec, alias: impl Into<String>) -> Self {
        Relation::Derived {
            input: Box::new(input),
            alias: alias.into(),
        }
    }

    pub fn alias(&self) -> &str {
        match self {
            Relation::Table { alias, .. } => alias,
            Relation::Query { alias, .. } => alias,
            Relation::Derived { alias, .. } => alias,
        }
    }
}

/// `<kind> JOIN relation ON l1 = r1 AND l2 = r2 ...`
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub kind: JoinKind,
    pub relation: Relation,
    /// Equality pairs; more than one for composite keys
    pub on: Vec<(Column, Column)>,
}

/// `expr AS alias`
#[derive(Debug, Clone, PartialEq)]
pub struct SelectItem {
    pub expr: Expr,
    pub alias: Option<String>,
}

impl SelectItem {
    pub fn aliased(expr: Expr, alias: impl Into<String>) -> Self {
        Self {
            expr,
            alias: Some(alias.into()),
        }
    }

    pub fn bare(expr: Expr) -> Self {
        Self { expr, alias: None }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortKey {
    pub expr: Expr,
    pub order: SortOrder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: u64,
    pub offset: u64,
}

/// One SELECT statement
#[derive(Debug, Clone, PartialEq)]
pub struct SelectSpec {
    pub items: Vec<SelectItem>,
    pub from: Relation,
    pub joins: Vec<Join>,
    pub filter: Option<Expr>,
    pub group_by: Vec<Expr>,
    pub order_by: Vec<SortKey>,
    pub page: Option<Page>,
}

impl SelectSpec {
    pub fn new(from: Relation) -> Self {
        Self {
            items: Vec::new(),
            from,
            joins: Vec::new(),
            filter: None,
            group_by: Vec::new(),
            order_by: Vec::new(),
            page: None,
        }
    }

    pub fn with_items(mut self, items: Vec<SelectItem>) -> Self {
        self.items = items;
        self
    }

    pub fn with_joins(mut self, joins: Vec<Join>) -> Self {
        self.joins = joins;
        self
    }

    pub fn with_filter(mut self, filter: Option<Expr>) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_group_by(mut self, group_by: Vec<Expr>) -> Self {
        self.group_by = group_by;
        self
    }

    pub fn with_order_by(mut self, order_by: Vec<SortKey>) -> Self {
        self.order_by = order_by;
        self
    }

    pub fn with_page(mut self, page: Option<Page>) -> Self {
        self.page = page;
        self
    }

    /// Output column names, in select order
    pub fn output_names(&self) -> Vec<&str> {
        self.items
            .iter()
            .filter_map(|item| match (&item.alias, &item.expr) {
                (Some(alias), _) => Some(alias.as_str()),
                (None, Expr::Column(column)) => Some(column.name.as_str()),
                _ => None,
            })
            .collect()
    }

    /// The derived input this SELECT reads from, if any
    pub fn input(&self) -> Option<&SelectSpec> {
        match &self.from {
            Relation::Derived { input, .. } => Some(input),
            _ => None,
        }
    }
}

/// The three-layer pivot plan: pivot ← model ← dataset (base)
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    /// Outermost (pivot) layer; the other layers nest inside it
    pub root: SelectSpec,
    /// Pivot-layer output names in request order
    pub columns: Vec<String>,
}

impl Plan {
    /// Layers from the outermost to the base
    pub fn layers(&self) -> Vec<&SelectSpec> {
        let mut layers = vec![&self.root];
        let mut current = &self.root;
        while let Some(input) = current.input() {
            layers.push(input);
            current = input;
        }
        layers
    }

    pub fn base(&self) -> &SelectSpec {
        let mut current = &self.root;
        while let Some(input) = current.input() {
            current = input;
        }
        current
    }

    pub fn output_columns(&self) -> &[String] {
        &self.columns
    }
}

/// Flat single-dataset query plus its unpaginated count
#[derive(Debug, Clone, PartialEq)]
pub struct AdhocPlan {
    pub rows: SelectSpec,
    pub count: SelectSpec,
    /// Known output columns; `None` when a stored query decides them
    pub columns: Option<Vec<String>>,
    /// The requested limit, when `max_limit` lowered it
    pub capped_from: Option<u64>,
}
