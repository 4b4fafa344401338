use enrichly_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::EntityRecord;

/// Attribute path used to match [`DispatchScope::country`].
pub const COUNTRY_ATTRIBUTE: &str = "country";

/// Business eligibility rule evaluated against entity attributes.
///
/// Field paths are dot-separated. A field is "missing" when it is absent or
/// JSON `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EligibilityRule {
    /// Every entity is eligible.
    Always,
    /// Field is absent or null.
    FieldMissing {
        /// Attribute path.
        field: String,
    },
    /// Field holds a non-null value.
    FieldPresent {
        /// Attribute path.
        field: String,
    },
    /// Field equals the configured value.
    FieldEquals {
        /// Attribute path.
        field: String,
        /// Expected value.
        value: Value,
    },
    /// Field is missing or differs from the configured value.
    FieldNotEquals {
        /// Attribute path.
        field: String,
        /// Rejected value.
        value: Value,
    },
    /// Field equals one of the configured values.
    FieldIn {
        /// Attribute path.
        field: String,
        /// Accepted values.
        values: Vec<Value>,
    },
    /// Every nested rule holds.
    All {
        /// Nested rules.
        rules: Vec<EligibilityRule>,
    },
    /// At least one nested rule holds.
    Any {
        /// Nested rules.
        rules: Vec<EligibilityRule>,
    },
    /// Nested rule does not hold.
    Not {
        /// Negated rule.
        rule: Box<EligibilityRule>,
    },
}

impl EligibilityRule {
    /// Shorthand for [`EligibilityRule::FieldMissing`].
    #[must_use]
    pub fn missing(field: &str) -> Self {
        Self::FieldMissing {
            field: field.to_owned(),
        }
    }

    /// Shorthand for [`EligibilityRule::FieldPresent`].
    #[must_use]
    pub fn present(field: &str) -> Self {
        Self::FieldPresent {
            field: field.to_owned(),
        }
    }

    /// Shorthand for [`EligibilityRule::FieldEquals`].
    #[must_use]
    pub fn equals(field: &str, value: Value) -> Self {
        Self::FieldEquals {
            field: field.to_owned(),
            value,
        }
    }

    /// Shorthand for [`EligibilityRule::All`].
    #[must_use]
    pub fn all(rules: Vec<EligibilityRule>) -> Self {
        Self::All { rules }
    }

    /// Validates field paths and nested structure.
    pub fn validate(&self) -> AppResult<()> {
        match self {
            Self::Always => Ok(()),
            Self::FieldMissing { field }
            | Self::FieldPresent { field }
            | Self::FieldEquals { field, .. }
            | Self::FieldNotEquals { field, .. } => validate_field_path(field),
            Self::FieldIn { field, values } => {
                validate_field_path(field)?;
                if values.is_empty() {
                    return Err(AppError::Validation(format!(
                        "field_in rule for '{field}' requires at least one value"
                    )));
                }
                Ok(())
            }
            Self::All { rules } | Self::Any { rules } => {
                if rules.is_empty() {
                    return Err(AppError::Validation(
                        "composite eligibility rules require at least one nested rule".to_owned(),
                    ));
                }
                rules.iter().try_for_each(Self::validate)
            }
            Self::Not { rule } => rule.validate(),
        }
    }

    /// Evaluates this rule for one entity.
    #[must_use]
    pub fn matches(&self, record: &EntityRecord) -> bool {
        match self {
            Self::Always => true,
            Self::FieldMissing { field } => !is_present(record.attribute(field)),
            Self::FieldPresent { field } => is_present(record.attribute(field)),
            Self::FieldEquals { field, value } => record.attribute(field) == Some(value),
            Self::FieldNotEquals { field, value } => record.attribute(field) != Some(value),
            Self::FieldIn { field, values } => record
                .attribute(field)
                .is_some_and(|actual| values.iter().any(|value| value == actual)),
            Self::All { rules } => rules.iter().all(|rule| rule.matches(record)),
            Self::Any { rules } => rules.iter().any(|rule| rule.matches(record)),
            Self::Not { rule } => !rule.matches(record),
        }
    }
}

fn is_present(value: Option<&Value>) -> bool {
    value.is_some_and(|value| !value.is_null())
}

fn validate_field_path(field: &str) -> AppResult<()> {
    if field.trim().is_empty() || field.split('.').any(|segment| segment.trim().is_empty()) {
        return Err(AppError::Validation(format!(
            "eligibility field path '{field}' is invalid"
        )));
    }

    Ok(())
}

/// Caller-supplied selection narrowing candidates and counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DispatchScope {
    country: Option<String>,
}

impl DispatchScope {
    /// Scope that selects every entity.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Creates a scope limited to one country code.
    pub fn for_country(country: &str) -> AppResult<Self> {
        let country = country.trim();
        if country.is_empty() {
            return Err(AppError::Validation(
                "scope country must not be empty".to_owned(),
            ));
        }

        Ok(Self {
            country: Some(country.to_ascii_uppercase()),
        })
    }

    /// Builds a scope from an optional country filter; blank means unscoped.
    pub fn from_country_filter(country: Option<&str>) -> AppResult<Self> {
        match country.map(str::trim).filter(|value| !value.is_empty()) {
            Some(country) => Self::for_country(country),
            None => Ok(Self::all()),
        }
    }

    /// Returns the normalized country filter.
    #[must_use]
    pub fn country(&self) -> Option<&str> {
        self.country.as_deref()
    }

    /// Returns a stable textual key for cache partitioning.
    #[must_use]
    pub fn cache_key(&self) -> String {
        match &self.country {
            Some(country) => format!("country={country}"),
            None => "all".to_owned(),
        }
    }

    /// Returns whether one entity falls inside this scope.
    #[must_use]
    pub fn contains(&self, record: &EntityRecord) -> bool {
        let Some(country) = self.country.as_deref() else {
            return true;
        };

        record
            .attribute(COUNTRY_ATTRIBUTE)
            .and_then(Value::as_str)
            .is_some_and(|value| value.trim().eq_ignore_ascii_case(country))
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use serde_json::json;

    use super::{DispatchScope, EligibilityRule};
    use crate::{EntityId, EntityRecord, EntityRef, EntityType};

    fn domain(attributes: serde_json::Value) -> EntityRecord {
        EntityRecord::new(
            EntityRef::new(EntityType::Domain, EntityId::new()),
            attributes,
        )
        .unwrap_or_else(|_| unreachable!())
    }

    #[test]
    fn missing_treats_null_and_absent_alike() {
        let rule = EligibilityRule::missing("dns");

        assert!(rule.matches(&domain(json!({"domain": "a.no"}))));
        assert!(rule.matches(&domain(json!({"domain": "a.no", "dns": null}))));
        assert!(!rule.matches(&domain(json!({"domain": "a.no", "dns": false}))));
    }

    #[test]
    fn composite_rule_matches_mx_candidates() {
        let rule = EligibilityRule::all(vec![
            EligibilityRule::equals("dns", json!(true)),
            EligibilityRule::missing("mx"),
        ]);

        assert!(rule.matches(&domain(json!({"dns": true}))));
        assert!(!rule.matches(&domain(json!({"dns": true, "mx": true}))));
        assert!(!rule.matches(&domain(json!({"dns": false}))));
    }

    #[test]
    fn field_in_requires_membership() {
        let rule = EligibilityRule::FieldIn {
            field: "organization_form_code".to_owned(),
            values: vec![json!("AS"), json!("ASA")],
        };

        assert!(rule.matches(&domain(json!({"organization_form_code": "ASA"}))));
        assert!(!rule.matches(&domain(json!({"organization_form_code": "ENK"}))));
        assert!(!rule.matches(&domain(json!({}))));
    }

    #[test]
    fn validate_rejects_empty_composites_and_paths() {
        assert!(EligibilityRule::all(Vec::new()).validate().is_err());
        assert!(EligibilityRule::missing("a..b").validate().is_err());
        assert!(
            EligibilityRule::FieldIn {
                field: "code".to_owned(),
                values: Vec::new(),
            }
            .validate()
            .is_err()
        );
        assert!(EligibilityRule::missing("web.title").validate().is_ok());
    }

    #[test]
    fn rule_deserializes_from_tagged_json() {
        let rule = serde_json::from_value::<EligibilityRule>(json!({
            "type": "all",
            "rules": [
                {"type": "field_equals", "field": "www", "value": true},
                {"type": "field_present", "field": "a_record_ip"},
                {"type": "not", "rule": {"type": "field_present", "field": "web_content_data"}}
            ]
        }));
        assert!(rule.is_ok());
        let rule = rule.unwrap_or_else(|_| unreachable!());

        assert!(rule.matches(&domain(json!({"www": true, "a_record_ip": "10.0.0.1"}))));
        assert!(!rule.matches(&domain(json!({"www": true}))));
    }

    #[test]
    fn scope_matches_country_case_insensitively() {
        let scope = DispatchScope::for_country("no").unwrap_or_else(|_| unreachable!());

        assert_eq!(scope.country(), Some("NO"));
        assert!(scope.contains(&domain(json!({"country": "No"}))));
        assert!(!scope.contains(&domain(json!({"country": "SE"}))));
        assert!(!scope.contains(&domain(json!({}))));
        assert!(DispatchScope::all().contains(&domain(json!({}))));
    }

    #[test]
    fn blank_country_filter_means_unscoped() {
        let scope = DispatchScope::from_country_filter(Some("  "));
        assert_eq!(scope.ok(), Some(DispatchScope::all()));
    }

    proptest! {
        #[test]
        fn not_inverts_field_rules(field in "[a-z]{1,8}", present in any::<bool>(), flag in any::<bool>()) {
            let attributes = if present {
                json!({ field.clone(): flag })
            } else {
                json!({})
            };
            let record = domain(attributes);
            let rule = EligibilityRule::equals(field.as_str(), json!(true));
            let negated = EligibilityRule::Not { rule: Box::new(rule.clone()) };

            prop_assert_ne!(rule.matches(&record), negated.matches(&record));
        }

        #[test]
        fn missing_and_present_are_complementary(value in proptest::option::of(any::<i64>())) {
            let attributes = match value {
                Some(value) => json!({"score": value}),
                None => json!({"score": null}),
            };
            let record = domain(attributes);

            prop_assert_ne!(
                EligibilityRule::missing("score").matches(&record),
                EligibilityRule::present("score").matches(&record)
            );
        }
    }
}
