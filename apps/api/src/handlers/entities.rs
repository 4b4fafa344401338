use axum::Json;
use axum::extract::{Path, State};
use enrichly_core::AppError;
use enrichly_domain::{EntityId, EntityRef, EntityType};

use crate::dto::{EntityResponse, PutEntityRequest};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn put_entity_handler(
    State(state): State<AppState>,
    Path((entity_type, entity_id)): Path<(String, String)>,
    Json(payload): Json<PutEntityRequest>,
) -> ApiResult<Json<EntityResponse>> {
    let entity = parse_entity_ref(entity_type.as_str(), entity_id.as_str())?;
    let record = state
        .entity_directory
        .register_entity(entity, payload.attributes)
        .await?;

    Ok(Json(EntityResponse::from(record)))
}

pub async fn get_entity_handler(
    State(state): State<AppState>,
    Path((entity_type, entity_id)): Path<(String, String)>,
) -> ApiResult<Json<EntityResponse>> {
    let entity = parse_entity_ref(entity_type.as_str(), entity_id.as_str())?;
    let record = state
        .entity_directory
        .find_entity(entity)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("entity '{entity}' does not exist")))?;

    Ok(Json(EntityResponse::from(record)))
}

fn parse_entity_ref(entity_type: &str, entity_id: &str) -> Result<EntityRef, AppError> {
    Ok(EntityRef::new(
        EntityType::parse(entity_type)?,
        EntityId::parse(entity_id)?,
    ))
}
