use axum::Json;
use axum::extract::{Path, Query, State};
use enrichly_domain::{DispatchScope, ServiceName};

use crate::dto::{
    CandidatesQuery, CandidatesResponse, DispatchQueueRequest, DispatchQueueResponse,
    QueueStatusResponse, ScopeQuery,
};
use crate::error::ApiResult;
use crate::state::AppState;

const DEFAULT_CANDIDATE_PREVIEW_LIMIT: usize = 25;
const MAX_CANDIDATE_PREVIEW_LIMIT: usize = 1000;

pub async fn dispatch_queue_handler(
    State(state): State<AppState>,
    Path(service_name): Path<String>,
    payload: Option<Json<DispatchQueueRequest>>,
) -> ApiResult<Json<DispatchQueueResponse>> {
    let payload = payload.map(|Json(payload)| payload).unwrap_or_default();
    let scope = DispatchScope::from_country_filter(payload.country.as_deref())?;
    let requested_count = match payload.count {
        Some(count) => count,
        None => i64::from(
            state
                .ledger
                .find_service(service_name.as_str())
                .await?
                .default_batch_size(),
        ),
    };

    let batch = state
        .ledger
        .dispatch(service_name.as_str(), requested_count, &scope)
        .await?;

    Ok(Json(DispatchQueueResponse::from(batch)))
}

pub async fn queue_status_handler(
    State(state): State<AppState>,
    Path(service_name): Path<String>,
    Query(query): Query<ScopeQuery>,
) -> ApiResult<Json<QueueStatusResponse>> {
    let scope = DispatchScope::from_country_filter(query.country.as_deref())?;
    let service_name = ServiceName::new(service_name)?;
    let counters = state
        .ledger
        .counters(service_name.as_str(), &scope)
        .await?;

    Ok(Json(QueueStatusResponse::new(&service_name, counters)))
}

pub async fn queue_candidates_handler(
    State(state): State<AppState>,
    Path(service_name): Path<String>,
    Query(query): Query<CandidatesQuery>,
) -> ApiResult<Json<CandidatesResponse>> {
    let scope = DispatchScope::from_country_filter(query.country.as_deref())?;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_CANDIDATE_PREVIEW_LIMIT)
        .min(MAX_CANDIDATE_PREVIEW_LIMIT);

    let candidates = state
        .ledger
        .candidates(service_name.as_str(), &scope)
        .await?;

    Ok(Json(CandidatesResponse::new(
        candidates.service().service_name(),
        candidates.len(),
        candidates
            .iter()
            .take(limit)
            .map(|record| record.entity().entity_id),
    )))
}
