use std::sync::Arc;

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use enrichly_application::{EntityDirectoryService, ServiceDispatchLedger};
use enrichly_domain::{EntityId, ServiceName};
use enrichly_infrastructure::{
    InMemoryJobQueue, InMemoryLedgerCountersCache, InMemoryLedgerRepository,
    InMemoryServiceCatalogRepository,
};
use serde_json::json;

use crate::dto::{
    AuditRecordsQuery, CandidatesQuery, CompleteJobRequest, DispatchQueueRequest,
    PutEntityRequest, ScopeQuery, UpdateServiceSettingsRequest,
};
use crate::error::ApiError;
use crate::middleware::WorkerIdentity;
use crate::state::AppState;

use super::{audit, entities, health, queue, services, worker};

const SERVICE: &str = "domain_testing";

struct Harness {
    state: AppState,
    queue: Arc<InMemoryJobQueue>,
}

fn harness() -> Harness {
    let repository = Arc::new(InMemoryLedgerRepository::new());
    let catalog = InMemoryServiceCatalogRepository::with_builtin_services();
    assert!(catalog.is_ok());
    let catalog = Arc::new(catalog.unwrap_or_else(|_| unreachable!()));
    let queue = Arc::new(InMemoryJobQueue::new());
    let cache = Arc::new(InMemoryLedgerCountersCache::new());

    let state = AppState {
        ledger: ServiceDispatchLedger::new(repository.clone(), catalog.clone(), queue.clone())
            .with_counters_cache(cache.clone(), 30),
        entity_directory: EntityDirectoryService::new(repository, catalog)
            .with_counters_cache(cache),
        worker_shared_secret: Some("worker-secret-0123456789".to_owned()),
        postgres_pool: None,
        redis_client: None,
        redis_required: false,
    };

    Harness { state, queue }
}

async fn put_domain(state: &AppState, domain: &str, country: &str) -> String {
    let entity_id = EntityId::new().to_string();
    let response = entities::put_entity_handler(
        State(state.clone()),
        Path(("domain".to_owned(), entity_id.clone())),
        Json(PutEntityRequest {
            attributes: json!({"domain": domain, "country": country}),
        }),
    )
    .await;
    assert!(response.is_ok());
    entity_id
}

fn status_of(error: ApiError) -> StatusCode {
    error.into_response().status()
}

fn service_name() -> ServiceName {
    ServiceName::new(SERVICE).unwrap_or_else(|_| unreachable!())
}

#[tokio::test]
async fn dispatch_without_body_uses_default_batch_size() {
    let harness = harness();
    for index in 0..3 {
        put_domain(&harness.state, &format!("site-{index}.example"), "NO").await;
    }

    let response =
        queue::dispatch_queue_handler(State(harness.state.clone()), Path(SERVICE.to_owned()), None)
            .await;
    assert!(response.is_ok());
    let Json(body) = response.unwrap_or_else(|_| unreachable!());

    assert!(body.success);
    assert_eq!(body.queued_count, 3);
    assert_eq!(body.requested_count, 100);
    assert_eq!(body.available_count, 3);
    assert_eq!(body.entity_ids.len(), 3);
    assert!(body.message.contains("Queued 3 of 100"));
    assert_eq!(harness.queue.queued_len(&service_name()).await, 3);
}

#[tokio::test]
async fn empty_pool_reports_unsuccessful_batch_without_error() {
    let harness = harness();

    let response = queue::dispatch_queue_handler(
        State(harness.state.clone()),
        Path(SERVICE.to_owned()),
        Some(Json(DispatchQueueRequest {
            count: Some(10),
            country: None,
        })),
    )
    .await;
    assert!(response.is_ok());
    let Json(body) = response.unwrap_or_else(|_| unreachable!());

    assert!(!body.success);
    assert_eq!(body.queued_count, 0);
    assert!(body.message.starts_with("No entities need"));
}

#[tokio::test]
async fn non_positive_count_is_bad_request() {
    let harness = harness();
    put_domain(&harness.state, "example.com", "NO").await;

    let response = queue::dispatch_queue_handler(
        State(harness.state.clone()),
        Path(SERVICE.to_owned()),
        Some(Json(DispatchQueueRequest {
            count: Some(0),
            country: None,
        })),
    )
    .await;

    assert!(matches!(
        response.map_err(status_of),
        Err(StatusCode::BAD_REQUEST)
    ));
    assert_eq!(harness.queue.queued_len(&service_name()).await, 0);
}

#[tokio::test]
async fn unknown_service_is_not_found() {
    let harness = harness();

    let response = queue::queue_status_handler(
        State(harness.state.clone()),
        Path("domain_unknown".to_owned()),
        Query(ScopeQuery::default()),
    )
    .await;

    assert!(matches!(
        response.map_err(status_of),
        Err(StatusCode::NOT_FOUND)
    ));
}

#[tokio::test]
async fn status_and_completion_agree_after_worker_callback() {
    let harness = harness();
    let entity_id = put_domain(&harness.state, "example.com", "NO").await;
    put_domain(&harness.state, "example.de", "DE").await;

    let dispatched = queue::dispatch_queue_handler(
        State(harness.state.clone()),
        Path(SERVICE.to_owned()),
        Some(Json(DispatchQueueRequest {
            count: Some(5),
            country: Some("NO".to_owned()),
        })),
    )
    .await;
    assert!(matches!(dispatched, Ok(Json(ref body)) if body.entity_ids == vec![entity_id.clone()]));

    let status = queue::queue_status_handler(
        State(harness.state.clone()),
        Path(SERVICE.to_owned()),
        Query(ScopeQuery {
            country: Some("NO".to_owned()),
        }),
    )
    .await;
    assert!(status.is_ok());
    let Json(status) = status.unwrap_or_else(|_| unreachable!());
    assert_eq!((status.needing, status.pending, status.completed), (0, 1, 0));

    let completed = worker::complete_job_handler(
        State(harness.state.clone()),
        Extension(WorkerIdentity {
            worker_id: "worker-a".to_owned(),
        }),
        Json(CompleteJobRequest {
            entity_type: "domain".to_owned(),
            entity_id: entity_id.clone(),
            service_name: SERVICE.to_owned(),
            outcome: "success".to_owned(),
            metadata: None,
            error_message: None,
            attribute_updates: Some(
                json!({"dns": true})
                    .as_object()
                    .cloned()
                    .unwrap_or_default(),
            ),
        }),
    )
    .await;
    assert!(completed.is_ok());
    let Json(record) = completed.unwrap_or_else(|_| unreachable!());
    assert_eq!(record.status, "success");
    assert_eq!(record.metadata["worker_id"], json!("worker-a"));
    assert!(record.completed_at.is_some());

    let status = queue::queue_status_handler(
        State(harness.state.clone()),
        Path(SERVICE.to_owned()),
        Query(ScopeQuery {
            country: Some("NO".to_owned()),
        }),
    )
    .await;
    let Json(status) = status.unwrap_or_else(|_| unreachable!());
    assert_eq!((status.needing, status.pending, status.completed), (0, 0, 1));
    assert!((status.completion_percentage - 100.0).abs() < f64::EPSILON);

    let entity = entities::get_entity_handler(
        State(harness.state.clone()),
        Path(("domain".to_owned(), entity_id)),
    )
    .await;
    assert!(matches!(entity, Ok(Json(ref body)) if body.attributes["dns"] == json!(true)));
}

#[tokio::test]
async fn repeated_completion_is_not_found() {
    let harness = harness();
    let entity_id = put_domain(&harness.state, "example.com", "NO").await;
    let dispatched =
        queue::dispatch_queue_handler(State(harness.state.clone()), Path(SERVICE.to_owned()), None)
            .await;
    assert!(dispatched.is_ok());

    let request = || CompleteJobRequest {
        entity_type: "domain".to_owned(),
        entity_id: entity_id.clone(),
        service_name: SERVICE.to_owned(),
        outcome: "failed".to_owned(),
        metadata: None,
        error_message: Some("NXDOMAIN".to_owned()),
        attribute_updates: None,
    };
    let identity = || {
        Extension(WorkerIdentity {
            worker_id: "worker-a".to_owned(),
        })
    };

    let first =
        worker::complete_job_handler(State(harness.state.clone()), identity(), Json(request()))
            .await;
    assert!(matches!(first, Ok(Json(ref record)) if record.status == "failed"));

    let second =
        worker::complete_job_handler(State(harness.state.clone()), identity(), Json(request()))
            .await;
    assert!(matches!(
        second.map_err(status_of),
        Err(StatusCode::NOT_FOUND)
    ));
}

#[tokio::test]
async fn candidates_preview_is_limited_but_counts_everything() {
    let harness = harness();
    for index in 0..5 {
        put_domain(&harness.state, &format!("site-{index}.example"), "NO").await;
    }

    let response = queue::queue_candidates_handler(
        State(harness.state.clone()),
        Path(SERVICE.to_owned()),
        Query(CandidatesQuery {
            country: None,
            limit: Some(2),
        }),
    )
    .await;
    assert!(response.is_ok());
    let Json(body) = response.unwrap_or_else(|_| unreachable!());
    assert_eq!(body.total, 5);
    assert_eq!(body.entity_ids.len(), 2);
}

#[tokio::test]
async fn paused_service_dispatches_nothing() {
    let harness = harness();
    put_domain(&harness.state, "example.com", "NO").await;

    let updated = services::update_service_settings_handler(
        State(harness.state.clone()),
        Path(SERVICE.to_owned()),
        Json(UpdateServiceSettingsRequest {
            is_active: Some(false),
            ..UpdateServiceSettingsRequest::default()
        }),
    )
    .await;
    assert!(matches!(updated, Ok(Json(ref service)) if !service.is_active));

    let dispatched =
        queue::dispatch_queue_handler(State(harness.state.clone()), Path(SERVICE.to_owned()), None)
            .await;
    assert!(matches!(dispatched, Ok(Json(ref body)) if body.queued_count == 0));

    let listed = services::list_services_handler(State(harness.state.clone())).await;
    assert!(listed.is_ok());
    let Json(listed) = listed.unwrap_or_else(|_| unreachable!());
    assert!(
        listed
            .iter()
            .any(|service| service.service_name == SERVICE && !service.is_active)
    );
}

#[tokio::test]
async fn entity_paths_are_validated() {
    let harness = harness();

    let bad_type = entities::put_entity_handler(
        State(harness.state.clone()),
        Path(("planet".to_owned(), EntityId::new().to_string())),
        Json(PutEntityRequest {
            attributes: json!({}),
        }),
    )
    .await;
    assert!(matches!(
        bad_type.map_err(status_of),
        Err(StatusCode::BAD_REQUEST)
    ));

    let missing = entities::get_entity_handler(
        State(harness.state.clone()),
        Path(("domain".to_owned(), EntityId::new().to_string())),
    )
    .await;
    assert!(matches!(
        missing.map_err(status_of),
        Err(StatusCode::NOT_FOUND)
    ));
}

#[tokio::test]
async fn audit_trail_lists_dispatched_records() {
    let harness = harness();
    let entity_id = put_domain(&harness.state, "example.com", "NO").await;
    let dispatched =
        queue::dispatch_queue_handler(State(harness.state.clone()), Path(SERVICE.to_owned()), None)
            .await;
    assert!(dispatched.is_ok());

    let records = audit::list_audit_records_handler(
        State(harness.state.clone()),
        Query(AuditRecordsQuery {
            entity_type: Some("domain".to_owned()),
            entity_id: Some(entity_id.clone()),
            status: Some("pending".to_owned()),
            ..AuditRecordsQuery::default()
        }),
    )
    .await;
    assert!(records.is_ok());
    let Json(records) = records.unwrap_or_else(|_| unreachable!());
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].entity_id, entity_id);
    assert_eq!(records[0].status, "pending");
    assert!(records[0].completed_at.is_none());

    let too_many = audit::list_audit_records_handler(
        State(harness.state.clone()),
        Query(AuditRecordsQuery {
            limit: Some(10_000),
            ..AuditRecordsQuery::default()
        }),
    )
    .await;
    assert!(matches!(
        too_many.map_err(status_of),
        Err(StatusCode::BAD_REQUEST)
    ));
}

#[tokio::test]
async fn health_is_ready_with_in_memory_backends() {
    let harness = harness();

    let (status, Json(body)) = health::health_handler(State(harness.state.clone())).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.ready);
    assert_eq!(body.postgres.status, "disabled");
    assert_eq!(body.redis.status, "disabled");
}

#[tokio::test]
async fn service_performance_reports_worker_outcomes() {
    let harness = harness();
    let entity_id = put_domain(&harness.state, "example.com", "NO").await;
    let dispatched = queue::dispatch_queue_handler(
        State(harness.state.clone()),
        Path(SERVICE.to_owned()),
        None,
    )
    .await;
    assert!(dispatched.is_ok());

    let completed = worker::complete_job_handler(
        State(harness.state.clone()),
        Extension(WorkerIdentity {
            worker_id: "worker-a".to_owned(),
        }),
        Json(CompleteJobRequest {
            entity_type: "domain".to_owned(),
            entity_id,
            service_name: SERVICE.to_owned(),
            outcome: "failed".to_owned(),
            metadata: None,
            error_message: Some("NXDOMAIN".to_owned()),
            attribute_updates: None,
        }),
    )
    .await;
    assert!(completed.is_ok());

    let performance = services::service_performance_handler(
        State(harness.state.clone()),
        Path(SERVICE.to_owned()),
    )
    .await;
    assert!(performance.is_ok());
    let Json(performance) = performance.unwrap_or_else(|_| unreachable!());
    assert_eq!(performance.total_runs, 1);
    assert_eq!(performance.failed_runs, 1);
    assert!(performance.success_rate_percent.abs() < f64::EPSILON);
    assert!(performance.needs_attention);
    assert!(!performance.healthy);

    let unknown = services::service_performance_handler(
        State(harness.state.clone()),
        Path("domain_unknown".to_owned()),
    )
    .await;
    assert!(matches!(
        unknown.map_err(status_of),
        Err(StatusCode::NOT_FOUND)
    ));
}
