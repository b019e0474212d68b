//! Error paths that must be reported before any SQL is rendered

mod common;

use std::sync::Arc;

use common::{load_fixture, pivot, CountingRenderer};
use pivotsql::{Error, ErrorKind, FilterOperator, FilterPredicate, InMemoryCatalog, QueryService, ServiceConfig};
use serde_json::json;

fn counted_service() -> (QueryService, Arc<CountingRenderer>) {
    let renderer = Arc::new(CountingRenderer::default());
    let catalog = Arc::new(InMemoryCatalog::from_file(load_fixture("sales.yaml")));
    let service = QueryService::new(catalog, ServiceConfig::default()).with_renderer(renderer.clone());
    (service, renderer)
}

#[tokio::test]
async fn test_unknown_dimension_is_reported_by_name() {
    let (service, renderer) = counted_service();

    let err = service
        .pivot(&pivot(101, &["region", "channel"], &["revenue"]))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::FieldNotFound);
    assert_eq!(err.missing_field(), Some("channel"));
    assert!(err.to_string().contains("channel"));
    assert_eq!(renderer.calls(), 0);
}

#[tokio::test]
async fn test_unknown_measure_and_filter_field() {
    let (service, renderer) = counted_service();

    let err = service
        .compile_pivot(&pivot(101, &["region"], &["margin"]))
        .await
        .unwrap_err();
    assert_eq!(err.missing_field(), Some("margin"));

    let mut request = pivot(101, &["region"], &["revenue"]);
    request.filters = vec![FilterPredicate::new("discount", FilterOperator::Gt, json!(0))];
    let err = service.compile_pivot(&request).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FieldNotFound);

    assert_eq!(renderer.calls(), 0);
}

#[tokio::test]
async fn test_non_scalar_filter_value_is_invalid() {
    let (service, renderer) = counted_service();
    let mut request = pivot(100, &["region"], &["revenue"]);
    request.filters = vec![FilterPredicate::new("region", FilterOperator::Eq, json!(["EU", "US"]))];

    let err = service.compile_pivot(&request).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    assert_eq!(renderer.calls(), 0);
}

#[tokio::test]
async fn test_unknown_model() {
    let (service, renderer) = counted_service();

    let err = service.pivot(&pivot(999, &["region"], &[])).await.unwrap_err();

    assert!(matches!(err, Error::ModelNotFound(999)));
    assert_eq!(err.kind(), ErrorKind::ModelNotFound);
    assert_eq!(renderer.calls(), 0);
}

#[tokio::test]
async fn test_model_spanning_two_data_sources() {
    let (service, renderer) = counted_service();

    let err = service
        .compile_pivot(&pivot(300, &["region"], &["revenue"]))
        .await
        .unwrap_err();

    match &err {
        Error::CrossSourceModel { model, data_sources } => {
            assert_eq!(model, "mixed");
            assert_eq!(data_sources, &vec![1, 2]);
        }
        other => panic!("expected CrossSourceModel, got {other:?}"),
    }
    assert_eq!(err.kind(), ErrorKind::CrossSourceModel);
    assert_eq!(renderer.calls(), 0);
}

#[tokio::test]
async fn test_unsupported_db_type() {
    let (service, renderer) = counted_service();

    let err = service.pivot(&pivot(600, &["region"], &[])).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::UnsupportedBackend);
    assert_eq!(renderer.calls(), 0);
}

#[tokio::test]
async fn test_file_source_cannot_run_pivots() {
    let (service, renderer) = counted_service();

    let err = service.pivot(&pivot(500, &["region"], &[])).await.unwrap_err();

    assert!(matches!(err, Error::NotExecutable { id: 4, .. }));
    assert_eq!(err.kind(), ErrorKind::UnsupportedBackend);
    assert_eq!(renderer.calls(), 0);
}

#[tokio::test]
async fn test_renderable_dialect_without_driver() {
    let (service, renderer) = counted_service();

    // SQL Server renders, but there is no driver to run it
    let err = service
        .pivot(&pivot(400, &["account"], &["balance"]))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::UnsupportedBackend);
    assert_eq!(renderer.calls(), 1);
}

#[tokio::test]
async fn test_missing_member_dataset() {
    let catalog = Arc::new(InMemoryCatalog::from_file(load_fixture("sales.yaml")));
    catalog.remove_dataset(12);
    let service = QueryService::new(catalog, ServiceConfig::default());

    let err = service
        .compile_pivot(&pivot(101, &["region"], &["revenue"]))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::DatasetNotFound(12)));
}

#[tokio::test]
async fn test_unknown_name_reported_before_members_load() {
    let catalog = Arc::new(InMemoryCatalog::from_file(load_fixture("sales.yaml")));
    catalog.remove_dataset(12);
    let service = QueryService::new(catalog, ServiceConfig::default());

    let err = service
        .compile_pivot(&pivot(101, &["region", "planet"], &["revenue"]))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::FieldNotFound);
    assert_eq!(err.missing_field(), Some("planet"));
}

#[tokio::test]
async fn test_unknown_data_source() {
    let (service, _) = counted_service();

    let err = service.test_connection(42).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DataSourceNotFound);

    let err = service.list_relations(42).await.unwrap_err();
    assert!(matches!(err, Error::DataSourceNotFound(42)));
}

#[tokio::test]
async fn test_connection_to_driverless_backend_reports_failure() {
    let (service, _) = counted_service();

    let status = service.test_connection(3).await.unwrap();

    assert!(!status.ok);
    assert!(status.diagnostic.is_some());
}
