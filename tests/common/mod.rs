//! Shared test utilities for integration tests
#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use pivotsql::catalog::SourceKind;
use pivotsql::{
    parser, CatalogFile, Dialect, InMemoryCatalog, PivotRequest, QueryService, Render, RenderError,
    RenderedQuery, SelectSpec, ServiceConfig, SqlRenderer,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

/// Load a test fixture from the tests/test_data directory
pub fn load_fixture(name: &str) -> CatalogFile {
    let path = format!("tests/test_data/{}", name);
    parser::parse_file(&path).unwrap_or_else(|e| panic!("Failed to load test data {}: {}", name, e))
}

/// Point a SQLite data source at `path`
pub fn use_sqlite_file(catalog: &mut CatalogFile, source_id: i64, path: &Path) {
    let source = catalog
        .data_sources
        .iter_mut()
        .find(|s| s.id == source_id)
        .unwrap_or_else(|| panic!("no data source {}", source_id));
    match &mut source.kind {
        SourceKind::Database(db) => db.database = Some(path.display().to_string()),
        other => panic!("data source {} is {}, not a database", source_id, other.name()),
    }
}

/// Service over the sales fixture, with diagnostics enabled
pub fn sales_service(config: ServiceConfig) -> QueryService {
    QueryService::new(Arc::new(InMemoryCatalog::from_file(load_fixture("sales.yaml"))), config)
}

pub fn development() -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.environment = pivotsql::Environment::Development;
    config
}

pub fn pivot(model_id: i64, dimensions: &[&str], measures: &[&str]) -> PivotRequest {
    PivotRequest {
        model_id,
        dimensions: dimensions.iter().map(|s| s.to_string()).collect(),
        measures: measures.iter().map(|s| s.to_string()).collect(),
        ..Default::default()
    }
}

// =============================================================================
// Renderer call counting
// =============================================================================

/// Delegates to [`SqlRenderer`] and counts calls
#[derive(Debug, Default)]
pub struct CountingRenderer {
    calls: AtomicUsize,
}

impl CountingRenderer {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Render for CountingRenderer {
    fn render(&self, dialect: Dialect, select: &SelectSpec) -> Result<RenderedQuery, RenderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        SqlRenderer.render(dialect, select)
    }
}

// =============================================================================
// SQLite fixtures
// =============================================================================

/// A SQLite file with the tables the sales fixture describes.
///
/// | id | region | customer | product | amount |
/// |----|--------|----------|---------|--------|
/// | 1  | EU     | 1        | 1       | 100    |
/// | 2  | EU     | 2        | 2       | 50     |
/// | 3  | US     | 3        | 1       | 300    |
/// | 4  | APAC   | 1        | 2       | 20     |
/// | 5  | US     | 2        | 2       | 150    |
pub async fn seed_sales_db(dir: &tempfile::TempDir) -> std::path::PathBuf {
    let path = dir.path().join("warehouse.db");
    let options = SqliteConnectOptions::new().filename(&path).create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .expect("open sqlite");

    let statements = [
        "CREATE TABLE orders (id INTEGER PRIMARY KEY, region TEXT, customer_id INTEGER, product_id INTEGER, amount INTEGER)",
        "CREATE TABLE customers (id INTEGER PRIMARY KEY, name TEXT, country TEXT)",
        "CREATE TABLE products (id INTEGER PRIMARY KEY, category TEXT)",
        "INSERT INTO orders VALUES (1, 'EU', 1, 1, 100), (2, 'EU', 2, 2, 50), (3, 'US', 3, 1, 300), (4, 'APAC', 1, 2, 20), (5, 'US', 2, 2, 150)",
        "INSERT INTO customers VALUES (1, 'Acme', 'DE'), (2, 'Globex', 'FR'), (3, 'Initech', 'US')",
        "INSERT INTO products VALUES (1, 'hardware'), (2, 'software')",
    ];
    for statement in statements {
        sqlx::query(statement).execute(&pool).await.expect(statement);
    }
    pool.close().await;
    path
}

/// Service over the sales fixture with data source 1 backed by a seeded file
pub async fn seeded_service(dir: &tempfile::TempDir, config: ServiceConfig) -> QueryService {
    let path = seed_sales_db(dir).await;
    let mut catalog = load_fixture("sales.yaml");
    use_sqlite_file(&mut catalog, 1, &path);
    QueryService::new(Arc::new(InMemoryCatalog::from_file(catalog)), config)
}
