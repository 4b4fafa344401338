use chrono::Utc;
use enrichly_application::{
    AuditRecordQuery, CompletePendingInput, EntityRepository, LedgerRepository,
    ServiceCatalogRepository,
};
use enrichly_core::AppError;
use enrichly_domain::{
    AuditRecord, AuditStatus, CompletionOutcome, EntityId, EntityRecord, EntityRef, EntityType,
    ServiceDefinition, ServiceName, builtin_service_definitions,
};
use serde_json::{Map, json};
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;

use crate::PostgresServiceCatalogRepository;

use super::PostgresLedgerRepository;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(4)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for postgres ledger repository tests: {error}");
    }

    Some(pool)
}

async fn domain_testing(pool: &PgPool) -> ServiceDefinition {
    let catalog = PostgresServiceCatalogRepository::new(pool.clone());
    let builtins = builtin_service_definitions().unwrap_or_default();
    assert!(catalog.ensure_services(&builtins).await.is_ok());

    let name = ServiceName::new("domain_testing").unwrap_or_else(|_| unreachable!());
    catalog
        .find_service(&name)
        .await
        .unwrap_or_default()
        .unwrap_or_else(|| unreachable!())
}

async fn register_domain(repository: &PostgresLedgerRepository) -> EntityRef {
    let entity = EntityRef::new(EntityType::Domain, EntityId::new());
    let domain = format!("{}.example", entity.entity_id);
    let record = EntityRecord::new(entity, json!({ "domain": domain }))
        .unwrap_or_else(|_| unreachable!());
    assert!(repository.save_entity(record).await.is_ok());
    entity
}

fn completion(
    entity: EntityRef,
    service: &ServiceDefinition,
    outcome: CompletionOutcome,
) -> CompletePendingInput {
    CompletePendingInput {
        entity,
        service_name: service.service_name().clone(),
        outcome,
        completed_at: Utc::now(),
        metadata: Map::new(),
        error_message: None,
        attribute_updates: None,
    }
}

#[tokio::test]
async fn concurrent_claims_for_same_entity_store_one_pending_record() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresLedgerRepository::new(pool.clone());
    let service = domain_testing(&pool).await;
    let entity = register_domain(&repository).await;

    let first = repository.claim_pending(vec![AuditRecord::pending(
        entity,
        service.service_name().clone(),
        Utc::now(),
    )]);
    let second = repository.claim_pending(vec![AuditRecord::pending(
        entity,
        service.service_name().clone(),
        Utc::now(),
    )]);
    let (first, second) = tokio::join!(first, second);
    assert!(first.is_ok());
    assert!(second.is_ok());

    let stored = first.unwrap_or_default().len() + second.unwrap_or_default().len();
    assert_eq!(stored, 1);

    let snapshot = repository.load_snapshot(&service).await;
    assert!(snapshot.is_ok());
    assert!(
        snapshot
            .unwrap_or_else(|_| unreachable!())
            .pending
            .contains(&entity.entity_id)
    );
}

#[tokio::test]
async fn completion_is_single_shot_and_updates_attributes() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresLedgerRepository::new(pool.clone());
    let service = domain_testing(&pool).await;
    let entity = register_domain(&repository).await;

    let claimed = repository
        .claim_pending(vec![AuditRecord::pending(
            entity,
            service.service_name().clone(),
            Utc::now(),
        )])
        .await;
    assert!(matches!(claimed, Ok(ref stored) if stored.len() == 1));

    let mut input = completion(entity, &service, CompletionOutcome::Success);
    let mut patch = Map::new();
    patch.insert("dns".to_owned(), json!(true));
    input.attribute_updates = Some(patch);
    let completed = repository.complete_pending(input).await;
    assert!(completed.is_ok());
    let completed = completed.unwrap_or_else(|_| unreachable!());
    assert_eq!(completed.status(), AuditStatus::Success);
    assert!(completed.duration_ms().is_some());

    let repeated = repository
        .complete_pending(completion(entity, &service, CompletionOutcome::Failed))
        .await;
    assert!(matches!(repeated, Err(AppError::NotFound(_))));

    let stored = repository.find_entity(entity).await.unwrap_or_default();
    let stored = stored.unwrap_or_else(|| unreachable!());
    assert_eq!(stored.attribute("dns"), Some(&json!(true)));

    let snapshot = repository
        .load_snapshot(&service)
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(snapshot.last_success.contains_key(&entity.entity_id));
    assert!(!snapshot.pending.contains(&entity.entity_id));
}

#[tokio::test]
async fn release_removes_only_pending_records() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresLedgerRepository::new(pool.clone());
    let service = domain_testing(&pool).await;
    let completed_entity = register_domain(&repository).await;
    let pending_entity = register_domain(&repository).await;

    let claimed = repository
        .claim_pending(vec![
            AuditRecord::pending(completed_entity, service.service_name().clone(), Utc::now()),
            AuditRecord::pending(pending_entity, service.service_name().clone(), Utc::now()),
        ])
        .await
        .unwrap_or_default();
    assert_eq!(claimed.len(), 2);

    let completed = repository
        .complete_pending(completion(
            completed_entity,
            &service,
            CompletionOutcome::Failed,
        ))
        .await;
    assert!(completed.is_ok());

    let ids: Vec<_> = claimed.iter().map(AuditRecord::id).collect();
    let released = repository.release_pending(&ids).await;
    assert!(matches!(released, Ok(1)));

    let remaining = repository
        .list_audit_records(AuditRecordQuery {
            entity: Some(completed_entity),
            service_name: Some(service.service_name().clone()),
            status: None,
            limit: 10,
            offset: 0,
        })
        .await
        .unwrap_or_default();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].status(), AuditStatus::Failed);
}

#[tokio::test]
async fn ensure_services_keeps_operator_settings() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let catalog = PostgresServiceCatalogRepository::new(pool.clone());
    let service = domain_testing(&pool).await;

    let paused = service
        .with_settings(Some(false), Some(25), None)
        .unwrap_or_else(|_| unreachable!());
    assert!(catalog.save_service(paused).await.is_ok());

    let builtins = builtin_service_definitions().unwrap_or_default();
    assert!(catalog.ensure_services(&builtins).await.is_ok());

    let stored = catalog
        .find_service(service.service_name())
        .await
        .unwrap_or_default()
        .unwrap_or_else(|| unreachable!());
    assert!(!stored.is_active());
    assert_eq!(stored.default_batch_size(), 25);
    assert_eq!(stored.eligibility(), service.eligibility());

    let restored = stored
        .with_settings(Some(true), Some(100), None)
        .unwrap_or_else(|_| unreachable!());
    assert!(catalog.save_service(restored).await.is_ok());
}

#[tokio::test]
async fn performance_aggregates_terminal_runs() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresLedgerRepository::new(pool.clone());
    let service = domain_testing(&pool).await;
    let entity = register_domain(&repository).await;

    let claimed = repository
        .claim_pending(vec![AuditRecord::pending(
            entity,
            service.service_name().clone(),
            Utc::now(),
        )])
        .await;
    assert!(matches!(claimed, Ok(ref stored) if stored.len() == 1));
    let completed = repository
        .complete_pending(completion(entity, &service, CompletionOutcome::Success))
        .await;
    assert!(completed.is_ok());

    let performance = repository
        .service_performance(service.service_name())
        .await;
    assert!(performance.is_ok());
    let performance = performance.unwrap_or_else(|_| unreachable!());
    assert_eq!(&performance.service_name, service.service_name());
    assert!(performance.successful_runs >= 1);
    assert!(performance.avg_duration_ms.is_some());
    assert!(performance.min_duration_ms.is_some());
    assert!(performance.last_run_at.is_some());
}
