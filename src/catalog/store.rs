//! Catalog collaborator: where definitions are read from on every request

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use super::{DataSource, Dataset, Model};

/// Errors raised by a catalog backend
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("dataset {0} not found")]
    DatasetNotFound(i64),

    /// The backend could not answer (storage outage, decode failure, ...)
    #[error("catalog unavailable: {0}")]
    Unavailable(String),
}

/// Read-only view over stored definitions.
///
/// Implementations return owned values; callers treat them as an immutable
/// snapshot for the duration of one request and never cache them.
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn get_data_source(&self, id: i64) -> Result<Option<DataSource>, CatalogError>;

    async fn get_dataset(&self, id: i64) -> Result<Option<Dataset>, CatalogError>;

    async fn get_model(&self, id: i64) -> Result<Option<Model>, CatalogError>;

    /// Member datasets of `model`, in declared member order.
    async fn list_datasets_in_model(&self, model: &Model) -> Result<Vec<Dataset>, CatalogError> {
        let mut datasets = Vec::with_capacity(model.data_sets.len());
        for id in model.member_ids() {
            let dataset = self
                .get_dataset(id)
                .await?
                .ok_or(CatalogError::DatasetNotFound(id))?;
            datasets.push(dataset);
        }
        Ok(datasets)
    }
}

/// The on-disk catalog document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub data_sources: Vec<DataSource>,
    #[serde(default)]
    pub data_sets: Vec<Dataset>,
    #[serde(default)]
    pub data_models: Vec<Model>,
}

/// A catalog held in memory, editable while requests are in flight.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    data_sources: DashMap<i64, DataSource>,
    datasets: DashMap<i64, Dataset>,
    models: DashMap<i64, Model>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_file(file: CatalogFile) -> Self {
        let catalog = Self::new();
        for source in file.data_sources {
            catalog.put_data_source(source);
        }
        for dataset in file.data_sets {
            catalog.put_dataset(dataset);
        }
        for model in file.data_models {
            catalog.put_model(model);
        }
        catalog
    }

    /// Insert or replace a data source; later reads see the new definition.
    pub fn put_data_source(&self, source: DataSource) {
        self.data_sources.insert(source.id, source);
    }

    pub fn put_dataset(&self, dataset: Dataset) {
        self.datasets.insert(dataset.id, dataset);
    }

    pub fn put_model(&self, model: Model) {
        self.models.insert(model.id, model);
    }

    pub fn remove_dataset(&self, id: i64) -> Option<Dataset> {
        self.datasets.remove(&id).map(|(_, dataset)| dataset)
    }
}

#[async_trait]
impl Catalog for InMemoryCatalog {
    async fn get_data_source(&self, id: i64) -> Result<Option<DataSource>, CatalogError> {
        Ok(self.data_sources.get(&id).map(|entry| entry.value().clone()))
    }

    async fn get_dataset(&self, id: i64) -> Result<Option<Dataset>, CatalogError> {
        Ok(self.datasets.get(&id).map(|entry| entry.value().clone()))
    }

    async fn get_model(&self, id: i64) -> Result<Option<Model>, CatalogError> {
        Ok(self.models.get(&id).map(|entry| entry.value().clone()))
    }
}
