//! A model together with its loaded member datasets

use crate::catalog::{Dataset, DatasetRole, Model};

use super::error::ResolveError;

/// A member dataset with its deterministic table alias
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub dataset: Dataset,
    /// `t1`, `t2`, ... by declared member position
    pub alias: String,
    pub role: DatasetRole,
    /// Alias the model author gave the member, if any
    pub model_alias: Option<String>,
}

impl Member {
    pub fn id(&self) -> i64 {
        self.dataset.id
    }

    /// True when a reference qualifier points at this member
    pub fn answers_to(&self, qualifier: &str) -> bool {
        self.alias == qualifier
            || self.model_alias.as_deref() == Some(qualifier)
            || self.dataset.answers_to(qualifier)
    }
}

/// The resolved join graph of a model.
///
/// Built once per request from the catalog's current definitions.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelGraph {
    pub model: Model,
    members: Vec<Member>,
}

impl ModelGraph {
    /// Pair the model with its datasets and assign aliases.
    ///
    /// `datasets` may come in any order; members are laid out in the
    /// model's declared order and the first one becomes the driving dataset.
    pub fn new(model: Model, datasets: Vec<Dataset>) -> Result<Self, ResolveError> {
        if model.data_sets.is_empty() {
            return Err(ResolveError::EmptyModel(model.name.clone()));
        }

        let members = model
            .data_sets
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let dataset = datasets
                    .iter()
                    .find(|d| d.id == entry.data_set_id)
                    .cloned()
                    .ok_or(ResolveError::DatasetNotFound(entry.data_set_id))?;
                Ok(Member {
                    dataset,
                    alias: format!("t{}", i + 1),
                    role: entry.role,
                    model_alias: entry.alias.clone(),
                })
            })
            .collect::<Result<Vec<_>, ResolveError>>()?;

        for rel in &model.relationships {
            for endpoint in [rel.source_data_set, rel.target_data_set] {
                if !model.is_member(endpoint) {
                    return Err(ResolveError::UnresolvedRelationship {
                        model: model.name.clone(),
                        dataset_id: endpoint,
                    });
                }
            }
        }

        Ok(Self { model, members })
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn driving(&self) -> &Member {
        // Non-empty by construction
        &self.members[0]
    }

    pub fn member(&self, dataset_id: i64) -> Option<&Member> {
        self.members.iter().find(|m| m.id() == dataset_id)
    }

    pub fn alias_of(&self, dataset_id: i64) -> Option<&str> {
        self.member(dataset_id).map(|m| m.alias.as_str())
    }

    /// Distinct data sources behind the member datasets, in member order
    pub fn data_source_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = Vec::new();
        for member in &self.members {
            if !ids.contains(&member.dataset.data_source_id) {
                ids.push(member.dataset.data_source_id);
            }
        }
        ids
    }
}
