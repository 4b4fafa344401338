use axum::Json;
use axum::extract::{Path, State};

use crate::dto::{ServicePerformanceResponse, ServiceResponse, UpdateServiceSettingsRequest};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_services_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<ServiceResponse>>> {
    let services = state
        .ledger
        .list_services()
        .await?
        .into_iter()
        .map(ServiceResponse::from)
        .collect();

    Ok(Json(services))
}

pub async fn update_service_settings_handler(
    State(state): State<AppState>,
    Path(service_name): Path<String>,
    Json(payload): Json<UpdateServiceSettingsRequest>,
) -> ApiResult<Json<ServiceResponse>> {
    let service = state
        .ledger
        .update_service_settings(service_name.as_str(), payload.into())
        .await?;

    Ok(Json(ServiceResponse::from(service)))
}

pub async fn service_performance_handler(
    State(state): State<AppState>,
    Path(service_name): Path<String>,
) -> ApiResult<Json<ServicePerformanceResponse>> {
    let performance = state.ledger.performance(service_name.as_str()).await?;

    Ok(Json(ServicePerformanceResponse::from(performance)))
}
