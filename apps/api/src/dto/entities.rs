use enrichly_domain::EntityRecord;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

/// Incoming payload for registering or replacing one entity.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/put-entity-request.ts"
)]
pub struct PutEntityRequest {
    #[ts(type = "Record<string, unknown>")]
    pub attributes: Value,
}

/// API representation of one business entity.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/entity-response.ts"
)]
pub struct EntityResponse {
    pub entity_type: String,
    pub entity_id: String,
    #[ts(type = "Record<string, unknown>")]
    pub attributes: Value,
}

impl From<EntityRecord> for EntityResponse {
    fn from(value: EntityRecord) -> Self {
        let entity = value.entity();
        Self {
            entity_type: entity.entity_type.as_str().to_owned(),
            entity_id: entity.entity_id.to_string(),
            attributes: value.attributes_value(),
        }
    }
}
