//! Query service: catalog lookup → resolve → compile → render → execute

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::catalog::{Catalog, CatalogError, DataSource, Model};
use crate::compiler;
use crate::config::ServiceConfig;
use crate::connector::{connector_for, ConnectionStatus, PoolRegistry};
use crate::error::Error;
use crate::materializer::{run_adhoc, run_pivot};
use crate::plan::{AdhocPlan, Plan};
use crate::query::{AdhocRequest, Diagnostics, PivotRequest, QueryResult};
use crate::renderer::{Dialect, Render, RenderedQuery, SqlRenderer};
use crate::resolver::{check_requested_names, resolve_pivot, ModelGraph};

/// A pivot ready to run
#[derive(Debug, Clone)]
pub struct CompiledPivot {
    pub plan: Plan,
    pub query: RenderedQuery,
    pub source: DataSource,
}

/// An ad-hoc request ready to run
#[derive(Debug, Clone)]
pub struct CompiledAdhoc {
    pub plan: AdhocPlan,
    pub rows: RenderedQuery,
    pub count: RenderedQuery,
    pub source: DataSource,
}

/// Entry point for every request.
///
/// Definitions are read from the catalog on each call and never cached;
/// only connection pools outlive a request.
pub struct QueryService {
    catalog: Arc<dyn Catalog>,
    config: ServiceConfig,
    pools: PoolRegistry,
    renderer: Arc<dyn Render>,
}

impl QueryService {
    pub fn new(catalog: Arc<dyn Catalog>, config: ServiceConfig) -> Self {
        Self {
            catalog,
            pools: PoolRegistry::new(config.pool.clone()),
            config,
            renderer: Arc::new(SqlRenderer),
        }
    }

    /// Replace the SQL renderer
    pub fn with_renderer(mut self, renderer: Arc<dyn Render>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    // ---------------------------------------------------------------------------
    // Pivot
    // ---------------------------------------------------------------------------

    /// Resolve, compile and render a pivot without executing it.
    ///
    /// Every naming error surfaces before the renderer is called.
    #[instrument(skip_all, fields(model_id = request.model_id))]
    pub async fn compile_pivot(&self, request: &PivotRequest) -> Result<CompiledPivot, Error> {
        self.compile_pivot_inner(request)
            .await
            .inspect_err(|err| warn!(error = %err, kind = ?err.kind(), "pivot compilation failed"))
    }

    async fn compile_pivot_inner(&self, request: &PivotRequest) -> Result<CompiledPivot, Error> {
        let model = self.model(request.model_id).await?;
        check_requested_names(&model, request)?;
        let graph = self.load_graph(model).await?;

        let resolved = resolve_pivot(&graph, request, self.config.anchoring)?;
        let plan = compiler::compile_pivot(&resolved)?;

        let source = self.single_source(&graph).await?;
        let dialect = dialect_of(&source)?;
        let query = self.renderer.render_plan(dialect, &plan)?;
        debug!(dialect = %dialect, sql = %query.sql, params = query.params.len(), "rendered pivot");

        Ok(CompiledPivot { plan, query, source })
    }

    /// Compile and execute a pivot
    #[instrument(skip_all, fields(model_id = request.model_id))]
    pub async fn pivot(&self, request: &PivotRequest) -> Result<QueryResult, Error> {
        async {
            let compiled = self.compile_pivot_inner(request).await?;
            let connector = connector_for(&compiled.source, &self.pools, &self.config)?;
            let executor = connector.executor().ok_or(Error::NotExecutable {
                id: compiled.source.id,
                kind: compiled.source.kind.name(),
            })?;

            let mut result = run_pivot(executor, &compiled.query, &compiled.plan.columns).await?;
            if !self.config.is_production() {
                result.diagnostics = Some(Diagnostics {
                    sql: compiled.query.sql,
                    count_sql: None,
                });
            }
            Ok(result)
        }
        .await
        .inspect_err(|err: &Error| warn!(error = %err, kind = ?err.kind(), "pivot failed"))
    }

    // ---------------------------------------------------------------------------
    // Ad-hoc
    // ---------------------------------------------------------------------------

    #[instrument(skip_all, fields(dataset_id = request.dataset_id))]
    pub async fn compile_adhoc(&self, request: &AdhocRequest) -> Result<CompiledAdhoc, Error> {
        self.compile_adhoc_inner(request)
            .await
            .inspect_err(|err| warn!(error = %err, kind = ?err.kind(), "ad-hoc compilation failed"))
    }

    async fn compile_adhoc_inner(&self, request: &AdhocRequest) -> Result<CompiledAdhoc, Error> {
        let dataset = self
            .catalog
            .get_dataset(request.dataset_id)
            .await?
            .ok_or(Error::DatasetNotFound(request.dataset_id))?;

        let plan = compiler::compile_adhoc(&dataset, request, &self.config.adhoc)?;

        let source = self.data_source(dataset.data_source_id).await?;
        let dialect = dialect_of(&source)?;
        let rows = self.renderer.render(dialect, &plan.rows)?;
        let count = self.renderer.render(dialect, &plan.count)?;
        debug!(dialect = %dialect, sql = %rows.sql, count_sql = %count.sql, "rendered ad-hoc query");

        Ok(CompiledAdhoc {
            plan,
            rows,
            count,
            source,
        })
    }

    /// Compile and execute an ad-hoc request, with its total
    #[instrument(skip_all, fields(dataset_id = request.dataset_id))]
    pub async fn adhoc(&self, request: &AdhocRequest) -> Result<QueryResult, Error> {
        async {
            let compiled = self.compile_adhoc_inner(request).await?;
            let connector = connector_for(&compiled.source, &self.pools, &self.config)?;
            let executor = connector.executor().ok_or(Error::NotExecutable {
                id: compiled.source.id,
                kind: compiled.source.kind.name(),
            })?;

            let mut result = run_adhoc(
                executor,
                &compiled.rows,
                &compiled.count,
                compiled.plan.columns.as_deref(),
            )
            .await?;
            if !self.config.is_production() {
                result.diagnostics = Some(Diagnostics {
                    sql: compiled.rows.sql,
                    count_sql: Some(compiled.count.sql),
                });
            }
            Ok(result)
        }
        .await
        .inspect_err(|err: &Error| warn!(error = %err, kind = ?err.kind(), "ad-hoc query failed"))
    }

    // ---------------------------------------------------------------------------
    // Data source introspection
    // ---------------------------------------------------------------------------

    /// Test a data source; failures to connect are reported in the status
    #[instrument(skip_all, fields(data_source_id = id))]
    pub async fn test_connection(&self, id: i64) -> Result<ConnectionStatus, Error> {
        let source = self.data_source(id).await?;
        match connector_for(&source, &self.pools, &self.config) {
            Ok(connector) => Ok(connector.test_connection().await),
            Err(err) => Ok(ConnectionStatus::failed(err.to_string())),
        }
    }

    #[instrument(skip_all, fields(data_source_id = id))]
    pub async fn list_relations(&self, id: i64) -> Result<Vec<String>, Error> {
        async {
            let source = self.data_source(id).await?;
            let connector = connector_for(&source, &self.pools, &self.config)?;
            Ok(connector.list_relations().await?)
        }
        .await
        .inspect_err(|err: &Error| warn!(error = %err, "listing relations failed"))
    }

    #[instrument(skip_all, fields(data_source_id = id, relation = %relation))]
    pub async fn list_fields(&self, id: i64, relation: &str) -> Result<Vec<String>, Error> {
        async {
            let source = self.data_source(id).await?;
            let connector = connector_for(&source, &self.pools, &self.config)?;
            Ok(connector.list_fields(relation).await?)
        }
        .await
        .inspect_err(|err: &Error| warn!(error = %err, "listing fields failed"))
    }

    // ---------------------------------------------------------------------------
    // Catalog access
    // ---------------------------------------------------------------------------

    async fn model(&self, model_id: i64) -> Result<Model, Error> {
        self.catalog
            .get_model(model_id)
            .await?
            .ok_or(Error::ModelNotFound(model_id))
    }

    async fn load_graph(&self, model: Model) -> Result<ModelGraph, Error> {
        let datasets = self
            .catalog
            .list_datasets_in_model(&model)
            .await
            .map_err(|err| match err {
                CatalogError::DatasetNotFound(id) => Error::DatasetNotFound(id),
                other => Error::Catalog(other),
            })?;
        Ok(ModelGraph::new(model, datasets)?)
    }

    async fn data_source(&self, id: i64) -> Result<DataSource, Error> {
        self.catalog
            .get_data_source(id)
            .await?
            .ok_or(Error::DataSourceNotFound(id))
    }

    /// The one data source every member dataset reads from
    async fn single_source(&self, graph: &ModelGraph) -> Result<DataSource, Error> {
        let ids = graph.data_source_ids();
        match ids.as_slice() {
            [id] => self.data_source(*id).await,
            _ => Err(Error::CrossSourceModel {
                model: graph.model.name.clone(),
                data_sources: ids,
            }),
        }
    }
}

/// SQL dialect of a relational source
fn dialect_of(source: &DataSource) -> Result<Dialect, Error> {
    let db = source.database().ok_or(Error::NotExecutable {
        id: source.id,
        kind: source.kind.name(),
    })?;
    Ok(Dialect::from_db_type(&db.db_type)?)
}
