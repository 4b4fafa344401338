use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use enrichly_core::AppError;

use crate::error::ApiResult;
use crate::state::AppState;

/// Header carrying the calling worker's identifier.
pub const WORKER_ID_HEADER: &str = "x-enrichly-worker-id";

/// Worker that authenticated against the internal endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerIdentity {
    pub worker_id: String,
}

pub async fn require_worker_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let worker_id = authorize_worker(
        state.worker_shared_secret.as_deref(),
        request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok()),
        request
            .headers()
            .get(WORKER_ID_HEADER)
            .and_then(|value| value.to_str().ok()),
    )?;

    request
        .extensions_mut()
        .insert(WorkerIdentity { worker_id });
    Ok(next.run(request).await)
}

fn authorize_worker(
    shared_secret: Option<&str>,
    authorization: Option<&str>,
    worker_id: Option<&str>,
) -> Result<String, AppError> {
    let Some(shared_secret) = shared_secret else {
        return Err(AppError::Unauthorized(
            "worker endpoints are disabled; WORKER_SHARED_SECRET is not configured".to_owned(),
        ));
    };

    let token = authorization
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .ok_or_else(|| AppError::Unauthorized("worker bearer token is required".to_owned()))?;

    if !secrets_match(token.as_bytes(), shared_secret.as_bytes()) {
        return Err(AppError::Unauthorized("invalid worker token".to_owned()));
    }

    let worker_id = worker_id
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            AppError::Unauthorized(format!("{WORKER_ID_HEADER} header is required"))
        })?;

    Ok(worker_id.to_owned())
}

fn secrets_match(left: &[u8], right: &[u8]) -> bool {
    left.len() == right.len()
        && left
            .iter()
            .zip(right)
            .fold(0_u8, |difference, (a, b)| difference | (a ^ b))
            == 0
}
