use std::fmt::{Display, Formatter};

use enrichly_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{EligibilityRule, EntityType, MAX_DISPATCH_BATCH_SIZE};

const SERVICE_NAME_MAX_LENGTH: usize = 100;

/// Validated enrichment service identifier (`[a-z0-9_]`, at most 100 chars).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ServiceName(NonEmptyString);

impl ServiceName {
    /// Creates a validated service name.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = NonEmptyString::new(value)?;
        let raw = value.as_str();

        if raw.len() > SERVICE_NAME_MAX_LENGTH {
            return Err(AppError::Validation(format!(
                "service name must be at most {SERVICE_NAME_MAX_LENGTH} characters"
            )));
        }

        if !raw.chars().all(|character| {
            character.is_ascii_lowercase() || character.is_ascii_digit() || character == '_'
        }) {
            return Err(AppError::Validation(format!(
                "service name '{raw}' may only contain lowercase letters, digits and underscores"
            )));
        }

        Ok(Self(value))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<String> for ServiceName {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ServiceName> for String {
    fn from(value: ServiceName) -> Self {
        value.0.into()
    }
}

impl Display for ServiceName {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Input payload for building a service definition.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceDefinitionInput {
    /// Stable service name.
    pub service_name: String,
    /// Operator-facing label.
    pub display_name: String,
    /// Entity kind the service runs against.
    pub entity_type: EntityType,
    /// Whether the service accepts dispatches.
    pub is_active: bool,
    /// Batch size used when a caller does not request one.
    pub default_batch_size: u32,
    /// Hours after a success before the entity is eligible again.
    pub refresh_interval_hours: Option<u32>,
    /// Business eligibility rule.
    pub eligibility: EligibilityRule,
}

/// Configured enrichment service.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceDefinition {
    service_name: ServiceName,
    display_name: NonEmptyString,
    entity_type: EntityType,
    is_active: bool,
    default_batch_size: u32,
    refresh_interval_hours: Option<u32>,
    eligibility: EligibilityRule,
}

impl ServiceDefinition {
    /// Creates a validated service definition.
    pub fn new(input: ServiceDefinitionInput) -> AppResult<Self> {
        validate_batch_size(input.default_batch_size)?;
        validate_refresh_interval(input.refresh_interval_hours)?;
        input.eligibility.validate()?;

        Ok(Self {
            service_name: ServiceName::new(input.service_name)?,
            display_name: NonEmptyString::new(input.display_name)?,
            entity_type: input.entity_type,
            is_active: input.is_active,
            default_batch_size: input.default_batch_size,
            refresh_interval_hours: input.refresh_interval_hours,
            eligibility: input.eligibility,
        })
    }

    /// Returns the service name.
    #[must_use]
    pub fn service_name(&self) -> &ServiceName {
        &self.service_name
    }

    /// Returns the operator-facing label.
    #[must_use]
    pub fn display_name(&self) -> &NonEmptyString {
        &self.display_name
    }

    /// Returns the target entity kind.
    #[must_use]
    pub fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    /// Returns whether the service accepts dispatches.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Returns the default batch size.
    #[must_use]
    pub fn default_batch_size(&self) -> u32 {
        self.default_batch_size
    }

    /// Returns the refresh interval in hours.
    #[must_use]
    pub fn refresh_interval_hours(&self) -> Option<u32> {
        self.refresh_interval_hours
    }

    /// Returns the eligibility rule.
    #[must_use]
    pub fn eligibility(&self) -> &EligibilityRule {
        &self.eligibility
    }

    /// Returns a copy with updated operator settings.
    pub fn with_settings(
        &self,
        is_active: Option<bool>,
        default_batch_size: Option<u32>,
        refresh_interval_hours: Option<Option<u32>>,
    ) -> AppResult<Self> {
        let default_batch_size = default_batch_size.unwrap_or(self.default_batch_size);
        let refresh_interval_hours = refresh_interval_hours.unwrap_or(self.refresh_interval_hours);
        validate_batch_size(default_batch_size)?;
        validate_refresh_interval(refresh_interval_hours)?;

        Ok(Self {
            is_active: is_active.unwrap_or(self.is_active),
            default_batch_size,
            refresh_interval_hours,
            ..self.clone()
        })
    }
}

fn validate_batch_size(value: u32) -> AppResult<()> {
    if value == 0 || value as usize > MAX_DISPATCH_BATCH_SIZE {
        return Err(AppError::Validation(format!(
            "default_batch_size must be between 1 and {MAX_DISPATCH_BATCH_SIZE}"
        )));
    }

    Ok(())
}

fn validate_refresh_interval(value: Option<u32>) -> AppResult<()> {
    if value == Some(0) {
        return Err(AppError::Validation(
            "refresh_interval_hours must be greater than zero when set".to_owned(),
        ));
    }

    Ok(())
}

/// Returns the built-in enrichment service catalog.
pub fn builtin_service_definitions() -> AppResult<Vec<ServiceDefinition>> {
    let monthly = Some(720);
    let definitions = vec![
        ServiceDefinitionInput {
            service_name: "domain_testing".to_owned(),
            display_name: "DNS Testing".to_owned(),
            entity_type: EntityType::Domain,
            is_active: true,
            default_batch_size: 100,
            refresh_interval_hours: None,
            eligibility: EligibilityRule::missing("dns"),
        },
        ServiceDefinitionInput {
            service_name: "domain_mx_testing".to_owned(),
            display_name: "MX Testing".to_owned(),
            entity_type: EntityType::Domain,
            is_active: true,
            default_batch_size: 100,
            refresh_interval_hours: None,
            eligibility: EligibilityRule::all(vec![
                EligibilityRule::equals("dns", json!(true)),
                EligibilityRule::missing("mx"),
            ]),
        },
        ServiceDefinitionInput {
            service_name: "domain_a_record_testing".to_owned(),
            display_name: "A Record Testing".to_owned(),
            entity_type: EntityType::Domain,
            is_active: true,
            default_batch_size: 100,
            refresh_interval_hours: None,
            eligibility: EligibilityRule::all(vec![
                EligibilityRule::equals("dns", json!(true)),
                EligibilityRule::missing("www"),
            ]),
        },
        ServiceDefinitionInput {
            service_name: "domain_web_content_extraction".to_owned(),
            display_name: "Web Content Extraction".to_owned(),
            entity_type: EntityType::Domain,
            is_active: true,
            default_batch_size: 50,
            refresh_interval_hours: monthly,
            eligibility: EligibilityRule::all(vec![
                EligibilityRule::equals("www", json!(true)),
                EligibilityRule::present("a_record_ip"),
                EligibilityRule::missing("web_content_data"),
            ]),
        },
        ServiceDefinitionInput {
            service_name: "company_financial_data".to_owned(),
            display_name: "Financial Data".to_owned(),
            entity_type: EntityType::Company,
            is_active: true,
            default_batch_size: 10,
            refresh_interval_hours: Some(8760),
            eligibility: EligibilityRule::all(vec![
                EligibilityRule::equals("source_country", json!("NO")),
                EligibilityRule::equals("source_registry", json!("brreg")),
                EligibilityRule::missing("ordinary_result"),
                EligibilityRule::FieldIn {
                    field: "organization_form_code".to_owned(),
                    values: vec![json!("AS"), json!("ASA"), json!("DA"), json!("ANS")],
                },
            ]),
        },
        ServiceDefinitionInput {
            service_name: "company_linkedin_discovery".to_owned(),
            display_name: "LinkedIn Discovery".to_owned(),
            entity_type: EntityType::Company,
            is_active: true,
            default_batch_size: 10,
            refresh_interval_hours: monthly,
            eligibility: EligibilityRule::missing("linkedin_url"),
        },
        ServiceDefinitionInput {
            service_name: "company_web_discovery".to_owned(),
            display_name: "Web Discovery".to_owned(),
            entity_type: EntityType::Company,
            is_active: true,
            default_batch_size: 10,
            refresh_interval_hours: monthly,
            eligibility: EligibilityRule::missing("website"),
        },
        ServiceDefinitionInput {
            service_name: "company_employee_discovery".to_owned(),
            display_name: "Employee Discovery".to_owned(),
            entity_type: EntityType::Company,
            is_active: true,
            default_batch_size: 10,
            refresh_interval_hours: monthly,
            eligibility: EligibilityRule::present("linkedin_url"),
        },
        ServiceDefinitionInput {
            service_name: "person_profile_extraction".to_owned(),
            display_name: "Profile Extraction".to_owned(),
            entity_type: EntityType::Person,
            is_active: true,
            default_batch_size: 10,
            refresh_interval_hours: monthly,
            eligibility: EligibilityRule::all(vec![
                EligibilityRule::present("profile_url"),
                EligibilityRule::missing("profile_data"),
            ]),
        },
        ServiceDefinitionInput {
            service_name: "person_email_verification".to_owned(),
            display_name: "Email Verification".to_owned(),
            entity_type: EntityType::Person,
            is_active: true,
            default_batch_size: 50,
            refresh_interval_hours: monthly,
            eligibility: EligibilityRule::all(vec![
                EligibilityRule::present("email"),
                EligibilityRule::missing("email_verification_status"),
            ]),
        },
    ];

    definitions.into_iter().map(ServiceDefinition::new).collect()
}

#[cfg(test)]
mod tests {
    use super::{ServiceDefinition, ServiceDefinitionInput, ServiceName, builtin_service_definitions};
    use crate::{EligibilityRule, EntityType};

    fn input() -> ServiceDefinitionInput {
        ServiceDefinitionInput {
            service_name: "domain_testing".to_owned(),
            display_name: "DNS Testing".to_owned(),
            entity_type: EntityType::Domain,
            is_active: true,
            default_batch_size: 100,
            refresh_interval_hours: None,
            eligibility: EligibilityRule::missing("dns"),
        }
    }

    #[test]
    fn service_name_rejects_uppercase_and_spaces() {
        assert!(ServiceName::new("DomainTesting").is_err());
        assert!(ServiceName::new("domain testing").is_err());
        assert!(ServiceName::new("x".repeat(101)).is_err());
        assert!(ServiceName::new("domain_testing_v2").is_ok());
    }

    #[test]
    fn definition_rejects_batch_size_above_cap() {
        let definition = ServiceDefinition::new(ServiceDefinitionInput {
            default_batch_size: 1001,
            ..input()
        });
        assert!(definition.is_err());
    }

    #[test]
    fn definition_rejects_zero_refresh_interval() {
        let definition = ServiceDefinition::new(ServiceDefinitionInput {
            refresh_interval_hours: Some(0),
            ..input()
        });
        assert!(definition.is_err());
    }

    #[test]
    fn with_settings_keeps_unspecified_values() {
        let definition = ServiceDefinition::new(input()).unwrap_or_else(|_| unreachable!());
        let updated = definition.with_settings(Some(false), None, Some(Some(24)));
        assert!(updated.is_ok());
        let updated = updated.unwrap_or_else(|_| unreachable!());

        assert!(!updated.is_active());
        assert_eq!(updated.default_batch_size(), 100);
        assert_eq!(updated.refresh_interval_hours(), Some(24));
        assert_eq!(updated.service_name().as_str(), "domain_testing");
    }

    #[test]
    fn builtin_catalog_is_valid_and_unique() {
        let definitions = builtin_service_definitions();
        assert!(definitions.is_ok());
        let definitions = definitions.unwrap_or_default();

        let mut names: Vec<&str> = definitions
            .iter()
            .map(|definition| definition.service_name().as_str())
            .collect();
        names.sort_unstable();
        names.dedup();

        assert_eq!(names.len(), 10);
        assert_eq!(names.len(), definitions.len());
    }
}
