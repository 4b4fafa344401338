use axum::Router;
use axum::routing::{get, patch, post};
use enrichly_core::AppError;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

mod cors;
mod worker_internal;

pub fn build_router(app_state: AppState, frontend_url: &str) -> Result<Router, AppError> {
    let ledger_routes = Router::new()
        .route(
            "/api/queue/{service_name}",
            post(handlers::queue::dispatch_queue_handler),
        )
        .route(
            "/api/queue/{service_name}/status",
            get(handlers::queue::queue_status_handler),
        )
        .route(
            "/api/queue/{service_name}/candidates",
            get(handlers::queue::queue_candidates_handler),
        )
        .route(
            "/api/services",
            get(handlers::services::list_services_handler),
        )
        .route(
            "/api/services/{service_name}",
            patch(handlers::services::update_service_settings_handler),
        )
        .route(
            "/api/services/{service_name}/performance",
            get(handlers::services::service_performance_handler),
        )
        .route(
            "/api/entities/{entity_type}/{entity_id}",
            get(handlers::entities::get_entity_handler)
                .put(handlers::entities::put_entity_handler),
        )
        .route(
            "/api/audit-records",
            get(handlers::audit::list_audit_records_handler),
        );

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .merge(ledger_routes)
        .merge(worker_internal::build_worker_internal_routes(
            app_state.clone(),
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors::build_cors_layer(frontend_url)?)
        .with_state(app_state))
}
