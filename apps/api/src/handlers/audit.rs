use axum::Json;
use axum::extract::{Query, State};
use enrichly_application::AuditRecordQuery;

use crate::dto::{AuditRecordResponse, AuditRecordsQuery};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_audit_records_handler(
    State(state): State<AppState>,
    Query(query): Query<AuditRecordsQuery>,
) -> ApiResult<Json<Vec<AuditRecordResponse>>> {
    let records = state
        .ledger
        .audit_trail(AuditRecordQuery::try_from(query)?)
        .await?
        .into_iter()
        .map(AuditRecordResponse::from)
        .collect();

    Ok(Json(records))
}
