use axum::Json;
use axum::extract::{Extension, State};
use tracing::info;

use crate::dto::{AuditRecordResponse, CompleteJobRequest};
use crate::error::ApiResult;
use crate::middleware::WorkerIdentity;
use crate::state::AppState;

pub async fn complete_job_handler(
    State(state): State<AppState>,
    Extension(worker): Extension<WorkerIdentity>,
    Json(payload): Json<CompleteJobRequest>,
) -> ApiResult<Json<AuditRecordResponse>> {
    let input = payload.into_input(worker.worker_id.as_str())?;
    let record = state.ledger.complete(input).await?;

    info!(
        worker_id = %worker.worker_id,
        audit_record_id = %record.id(),
        status = record.status().as_str(),
        "worker reported job completion"
    );

    Ok(Json(AuditRecordResponse::from(record)))
}
