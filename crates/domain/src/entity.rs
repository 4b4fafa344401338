use std::fmt::{Display, Formatter};

use enrichly_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Business record kinds that enrichment services run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    /// Registered company.
    Company,
    /// Internet domain.
    Domain,
    /// Individual contact.
    Person,
}

impl EntityType {
    /// Returns stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Company => "company",
            Self::Domain => "domain",
            Self::Person => "person",
        }
    }

    /// Parses storage value.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "company" => Ok(Self::Company),
            "domain" => Ok(Self::Domain),
            "person" => Ok(Self::Person),
            _ => Err(AppError::Validation(format!(
                "unknown entity type '{value}'"
            ))),
        }
    }
}

impl Display for EntityType {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Identifier of one business record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(Uuid);

impl EntityId {
    /// Creates a random entity identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an entity identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Parses an entity identifier from its textual UUID form.
    pub fn parse(value: &str) -> AppResult<Self> {
        Uuid::parse_str(value)
            .map(Self)
            .map_err(|error| AppError::Validation(format!("invalid entity id '{value}': {error}")))
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for EntityId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Typed reference to one business record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityRef {
    /// Record kind.
    pub entity_type: EntityType,
    /// Record identifier.
    pub entity_id: EntityId,
}

impl EntityRef {
    /// Creates an entity reference.
    #[must_use]
    pub fn new(entity_type: EntityType, entity_id: EntityId) -> Self {
        Self {
            entity_type,
            entity_id,
        }
    }
}

impl Display for EntityRef {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}:{}", self.entity_type, self.entity_id)
    }
}

/// Business record with its enrichment attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRecord {
    entity: EntityRef,
    attributes: Map<String, Value>,
}

impl EntityRecord {
    /// Creates a record from a JSON object payload.
    pub fn new(entity: EntityRef, attributes: Value) -> AppResult<Self> {
        let Value::Object(attributes) = attributes else {
            return Err(AppError::Validation(format!(
                "attributes for entity '{entity}' must be a JSON object"
            )));
        };

        Ok(Self { entity, attributes })
    }

    /// Returns the record reference.
    #[must_use]
    pub fn entity(&self) -> EntityRef {
        self.entity
    }

    /// Returns all attributes.
    #[must_use]
    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    /// Returns the attributes as one JSON object value.
    #[must_use]
    pub fn attributes_value(&self) -> Value {
        Value::Object(self.attributes.clone())
    }

    /// Resolves a dot-separated attribute path.
    #[must_use]
    pub fn attribute(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.attributes.get(first)?;

        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }

        Some(current)
    }

    /// Shallow-merges an attribute patch; `null` values are stored as-is.
    pub fn merge_attributes(&mut self, patch: &Map<String, Value>) {
        for (key, value) in patch {
            self.attributes.insert(key.clone(), value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{EntityId, EntityRecord, EntityRef, EntityType};

    #[test]
    fn entity_type_round_trips_storage_values() {
        for entity_type in [EntityType::Company, EntityType::Domain, EntityType::Person] {
            assert_eq!(EntityType::parse(entity_type.as_str()).ok(), Some(entity_type));
        }

        assert!(EntityType::parse("organisation").is_err());
    }

    #[test]
    fn record_requires_object_attributes() {
        let entity = EntityRef::new(EntityType::Domain, EntityId::new());
        assert!(EntityRecord::new(entity, json!(["example.com"])).is_err());
    }

    #[test]
    fn attribute_resolves_nested_paths() {
        let entity = EntityRef::new(EntityType::Company, EntityId::new());
        let record = EntityRecord::new(
            entity,
            json!({"financials": {"ordinary_result": 1200}, "country": "NO"}),
        );
        assert!(record.is_ok());
        let record = record.unwrap_or_else(|_| unreachable!());

        assert_eq!(
            record.attribute("financials.ordinary_result"),
            Some(&json!(1200))
        );
        assert_eq!(record.attribute("country.code"), None);
        assert_eq!(record.attribute("missing"), None);
    }

    #[test]
    fn merge_attributes_overwrites_top_level_keys() {
        let entity = EntityRef::new(EntityType::Domain, EntityId::new());
        let record = EntityRecord::new(entity, json!({"domain": "example.com", "dns": null}));
        let mut record = record.unwrap_or_else(|_| unreachable!());

        let patch = json!({"dns": true, "mx": false});
        let patch = patch.as_object().cloned().unwrap_or_default();
        record.merge_attributes(&patch);

        assert_eq!(
            record.attributes_value(),
            json!({"domain": "example.com", "dns": true, "mx": false})
        );
    }
}
