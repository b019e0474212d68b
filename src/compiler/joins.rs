//! Join graph planning: FROM clause and JOIN list for the base layer

use crate::catalog::{normalize_column, DatasetRelation, Relationship};
use crate::plan::{Column, Join, Relation};
use crate::resolver::{Member, ModelGraph};

use super::error::CompileError;

/// A join we emitted, remembered so composite keys can extend it
struct Edge {
    joined: i64,
    partner: i64,
    join: Join,
}

/// Relation a member contributes to a FROM or JOIN clause
pub fn member_relation(member: &Member) -> Relation {
    match member.dataset.relation() {
        DatasetRelation::Table(name) => Relation::table(name, member.alias.clone()),
        DatasetRelation::Query(sql) => Relation::query(sql, member.alias.clone()),
    }
}

/// Plan the FROM clause and joins, starting at the driving dataset.
///
/// Relationships are walked in declared order. A relationship whose target
/// is not yet joined brings in the target with the declared kind; one whose
/// source is not yet joined brings in the source with the kind mirrored.
/// Relationships touching only unjoined datasets wait until a later pass
/// reaches them. A second relationship between an already joined pair
/// extends that join's ON clause; any other relationship between two joined
/// datasets is a cycle.
pub fn plan_joins(graph: &ModelGraph, required: &[i64]) -> Result<(Relation, Vec<Join>), CompileError> {
    let model = &graph.model;
    let driving = graph.driving();

    let mut in_scope: Vec<i64> = vec![driving.id()];
    let mut edges: Vec<Edge> = Vec::new();
    let mut pending: Vec<&Relationship> = model.relationships.iter().collect();

    while !pending.is_empty() {
        let before = pending.len();
        let mut deferred = Vec::new();

        for rel in pending {
            let source = endpoint(graph, rel.source_data_set)?;
            let target = endpoint(graph, rel.target_data_set)?;
            let source_col = Column::new(source.alias.clone(), normalize_column(&rel.source_field));
            let target_col = Column::new(target.alias.clone(), normalize_column(&rel.target_field));

            match (in_scope.contains(&source.id()), in_scope.contains(&target.id())) {
                (true, false) => {
                    in_scope.push(target.id());
                    edges.push(Edge {
                        joined: target.id(),
                        partner: source.id(),
                        join: Join {
                            kind: rel.join_type,
                            relation: member_relation(target),
                            on: vec![(source_col, target_col)],
                        },
                    });
                }
                (false, true) => {
                    in_scope.push(source.id());
                    edges.push(Edge {
                        joined: source.id(),
                        partner: target.id(),
                        join: Join {
                            kind: rel.join_type.mirrored(),
                            relation: member_relation(source),
                            on: vec![(source_col, target_col)],
                        },
                    });
                }
                (true, true) => {
                    let pair = (source.id(), target.id());
                    let edge = edges.iter_mut().find(|e| {
                        (e.joined, e.partner) == pair || (e.partner, e.joined) == pair
                    });
                    match edge {
                        Some(edge) => edge.join.on.push((source_col, target_col)),
                        None => {
                            return Err(CompileError::CyclicJoinGraph {
                                model: model.name.clone(),
                                left: source.id(),
                                right: target.id(),
                            })
                        }
                    }
                }
                (false, false) => deferred.push(rel),
            }
        }

        if deferred.len() == before {
            // No relationship in this pass touched the joined set
            let stranded = endpoint(graph, deferred[0].source_data_set)?;
            return Err(disconnected(graph, stranded));
        }
        pending = deferred;
    }

    for id in required {
        if !in_scope.contains(id) {
            let member = endpoint(graph, *id)?;
            return Err(disconnected(graph, member));
        }
    }

    let joins = edges.into_iter().map(|e| e.join).collect();
    Ok((member_relation(driving), joins))
}

fn endpoint(graph: &ModelGraph, id: i64) -> Result<&Member, CompileError> {
    graph.member(id).ok_or_else(|| CompileError::DisconnectedDataset {
        model: graph.model.name.clone(),
        dataset: id.to_string(),
    })
}

fn disconnected(graph: &ModelGraph, member: &Member) -> CompileError {
    CompileError::DisconnectedDataset {
        model: graph.model.name.clone(),
        dataset: member.dataset.name.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Dataset, JoinKind, Model};

    const DATASETS: &str = r#"
- { id: 1, name: orders, data_source_id: 1, creation_mode: visual, visual_config: { tables: [orders] } }
- { id: 2, name: customers, data_source_id: 1, creation_mode: visual, visual_config: { tables: [customers] } }
- { id: 3, name: regions, data_source_id: 1, creation_mode: sql, sql_query: "SELECT * FROM region_map" }
- { id: 4, name: products, data_source_id: 1, creation_mode: visual, visual_config: { tables: [products] } }
"#;

    fn graph(model_yaml: &str) -> ModelGraph {
        let datasets: Vec<Dataset> = serde_yaml::from_str(DATASETS).unwrap();
        let model: Model = serde_yaml::from_str(model_yaml).unwrap();
        ModelGraph::new(model, datasets).unwrap()
    }

    #[test]
    fn test_star_joins_in_declared_order() {
        let g = graph(
            r#"
id: 1
name: star
data_sets: [{ data_set_id: 1 }, { data_set_id: 2 }, { data_set_id: 4 }]
relationships:
  - { source_data_set: 1, source_field: customer_id, target_data_set: 2, target_field: id, join_type: left }
  - { source_data_set: 1, source_field: product_id, target_data_set: 4, target_field: id }
"#,
        );
        let (from, joins) = plan_joins(&g, &[1, 2, 4]).unwrap();
        assert_eq!(from, Relation::table("orders", "t1"));
        assert_eq!(joins.len(), 2);
        assert_eq!(joins[0].kind, JoinKind::Left);
        assert_eq!(joins[0].relation.alias(), "t2");
        assert_eq!(joins[0].on, vec![(Column::new("t1", "customer_id"), Column::new("t2", "id"))]);
        assert_eq!(joins[1].relation.alias(), "t3");
    }

    #[test]
    fn test_reverse_relationship_mirrors_kind() {
        // customers drives, but the relationship is declared from orders
        let g = graph(
            r#"
id: 1
name: reverse
data_sets: [{ data_set_id: 2 }, { data_set_id: 1 }]
relationships:
  - { source_data_set: 1, source_field: customer_id, target_data_set: 2, target_field: id, join_type: left }
"#,
        );
        let (from, joins) = plan_joins(&g, &[]).unwrap();
        assert_eq!(from.alias(), "t1");
        assert_eq!(joins[0].kind, JoinKind::Right);
        assert_eq!(joins[0].relation, Relation::table("orders", "t2"));
    }

    #[test]
    fn test_snowflake_defers_until_reachable() {
        // customers -> regions is declared before orders -> customers
        let g = graph(
            r#"
id: 1
name: snowflake
model_type: snowflake
data_sets: [{ data_set_id: 1 }, { data_set_id: 2 }, { data_set_id: 3 }]
relationships:
  - { source_data_set: 2, source_field: region_code, target_data_set: 3, target_field: code }
  - { source_data_set: 1, source_field: customer_id, target_data_set: 2, target_field: id }
"#,
        );
        let (_, joins) = plan_joins(&g, &[3]).unwrap();
        let aliases: Vec<&str> = joins.iter().map(|j| j.relation.alias()).collect();
        assert_eq!(aliases, vec!["t2", "t3"]);
        assert_eq!(joins[1].relation, Relation::query("SELECT * FROM region_map", "t3"));
    }

    #[test]
    fn test_composite_key_extends_on_clause() {
        let g = graph(
            r#"
id: 1
name: composite
data_sets: [{ data_set_id: 1 }, { data_set_id: 2 }]
relationships:
  - { source_data_set: 1, source_field: customer_id, target_data_set: 2, target_field: id }
  - { source_data_set: 2, source_field: tenant, target_data_set: 1, target_field: tenant }
"#,
        );
        let (_, joins) = plan_joins(&g, &[]).unwrap();
        assert_eq!(joins.len(), 1);
        assert_eq!(joins[0].on.len(), 2);
    }

    #[test]
    fn test_cycle_is_rejected() {
        let g = graph(
            r#"
id: 1
name: cycle
data_sets: [{ data_set_id: 1 }, { data_set_id: 2 }, { data_set_id: 4 }]
relationships:
  - { source_data_set: 1, source_field: customer_id, target_data_set: 2, target_field: id }
  - { source_data_set: 1, source_field: product_id, target_data_set: 4, target_field: id }
  - { source_data_set: 2, source_field: favourite_product, target_data_set: 4, target_field: id }
"#,
        );
        let err = plan_joins(&g, &[]).unwrap_err();
        assert!(matches!(err, CompileError::CyclicJoinGraph { left: 2, right: 4, .. }));
    }

    #[test]
    fn test_unreachable_required_member() {
        let g = graph(
            r#"
id: 1
name: island
data_sets: [{ data_set_id: 1 }, { data_set_id: 2 }]
"#,
        );
        assert!(plan_joins(&g, &[1]).is_ok());
        let err = plan_joins(&g, &[2]).unwrap_err();
        assert!(matches!(err, CompileError::DisconnectedDataset { ref dataset, .. } if dataset == "customers"));
    }

    #[test]
    fn test_relationship_between_unreached_members() {
        let g = graph(
            r#"
id: 1
name: detached
data_sets: [{ data_set_id: 1 }, { data_set_id: 2 }, { data_set_id: 4 }]
relationships:
  - { source_data_set: 2, source_field: product_id, target_data_set: 4, target_field: id }
"#,
        );
        let err = plan_joins(&g, &[]).unwrap_err();
        assert!(matches!(err, CompileError::DisconnectedDataset { .. }));
    }
}
