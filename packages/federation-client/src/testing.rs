//! Testing utilities including mock implementations.
//!
//! [`MockApi`] stands in for the federation REST API so the catalog, the
//! submission adapter and invitations can be exercised without a server.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::api::FederationApi;
use crate::error::{FederationError, Result, ValidationErrors};
use crate::invitation::{
    AvailableEntities, AvailableEntity, EntityRef, Invitation, InvitationRequest, InvitationStatus,
};
use crate::record::RegistrantRecord;
use crate::submission::SubmissionPayload;
use crate::types::{
    AuthSession, AuthUser, CustomFieldAdded, CustomFieldCheck, CustomFieldEntry, FieldType,
    QuickRegistration,
};

/// A failure the mock should produce. [`FederationError`] holds a
/// `reqwest::Error` variant and cannot be cloned, so mocks store this instead.
#[derive(Debug, Clone)]
pub enum MockFailure {
    RateLimited,
    Server,
    Unauthorized,
    Validation(ValidationErrors),
}

impl MockFailure {
    fn to_error(&self) -> FederationError {
        match self {
            Self::RateLimited => FederationError::RateLimited("Too Many Attempts.".into()),
            Self::Server => FederationError::Server {
                status: 500,
                message: "Server Error".into(),
            },
            Self::Unauthorized => FederationError::Unauthorized {
                sign_in_required: true,
            },
            Self::Validation(errors) => FederationError::Validation(errors.clone()),
        }
    }
}

/// Record of a call made to the mock API.
#[derive(Debug, Clone, PartialEq)]
pub enum MockApiCall {
    DynamicOptions { field_type: FieldType },
    ValidateCustomField { field_type: FieldType, value: String },
    AddCustomField { field_type: FieldType, value: String },
    SubmitRegistration { payload: SubmissionPayload },
    Register { record: Value },
    CreateInvitation { request: InvitationRequest },
    AvailableEntities,
}

/// A mock federation API for testing.
///
/// Unconfigured catalogs return an empty remote list, custom values are
/// never duplicates, registrations succeed with sequential codes and
/// sign-ups with sequential tokens.
#[derive(Default)]
pub struct MockApi {
    /// Remote options by field type
    options: Arc<RwLock<HashMap<FieldType, Vec<String>>>>,

    /// Field types whose option fetch fails
    option_failures: Arc<RwLock<HashMap<FieldType, MockFailure>>>,

    /// Known custom values by field type; checking one reports a duplicate
    known_values: Arc<RwLock<HashMap<FieldType, Vec<String>>>>,

    registration_failure: Arc<RwLock<Option<MockFailure>>>,

    entities: Arc<RwLock<Vec<AvailableEntity>>>,

    /// Applied to every call
    latency: Duration,

    /// Call tracking for assertions
    calls: Arc<RwLock<Vec<MockApiCall>>>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every response.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Remote options returned for a field type.
    pub fn with_options(self, field_type: FieldType, options: &[&str]) -> Self {
        self.options
            .write()
            .unwrap()
            .insert(field_type, options.iter().map(|s| s.to_string()).collect());
        self
    }

    /// Make option fetches for a field type fail.
    pub fn failing_options(self, field_type: FieldType, failure: MockFailure) -> Self {
        self.option_failures
            .write()
            .unwrap()
            .insert(field_type, failure);
        self
    }

    /// Option fetches for a field type answer 429.
    pub fn rate_limited(self, field_type: FieldType) -> Self {
        self.failing_options(field_type, MockFailure::RateLimited)
    }

    /// A value the service already knows; checks against it report a duplicate.
    pub fn with_known_value(self, field_type: FieldType, value: impl Into<String>) -> Self {
        self.known_values
            .write()
            .unwrap()
            .entry(field_type)
            .or_default()
            .push(value.into());
        self
    }

    /// Make quick registrations and account sign-ups fail.
    pub fn failing_registration(self, failure: MockFailure) -> Self {
        *self.registration_failure.write().unwrap() = Some(failure);
        self
    }

    pub fn with_entity(self, entity: EntityRef, has_pending_invitation: bool) -> Self {
        self.entities.write().unwrap().push(AvailableEntity {
            entity,
            city: None,
            has_pending_invitation,
        });
        self
    }

    /// Get all calls made to this mock.
    pub fn calls(&self) -> Vec<MockApiCall> {
        self.calls.read().unwrap().clone()
    }

    /// Clear call history.
    pub fn clear_calls(&self) {
        self.calls.write().unwrap().clear();
    }

    /// Number of option fetches made for one field type.
    pub fn option_fetches(&self, field_type: FieldType) -> usize {
        self.calls
            .read()
            .unwrap()
            .iter()
            .filter(|c| matches!(c, MockApiCall::DynamicOptions { field_type: f } if *f == field_type))
            .count()
    }

    /// Payloads sent to the registration endpoint, in order.
    pub fn submitted_payloads(&self) -> Vec<SubmissionPayload> {
        self.calls
            .read()
            .unwrap()
            .iter()
            .filter_map(|c| match c {
                MockApiCall::SubmitRegistration { payload } => Some(payload.clone()),
                _ => None,
            })
            .collect()
    }

    /// Records sent to the account sign-up endpoint, in order.
    pub fn registered_accounts(&self) -> Vec<Value> {
        self.calls
            .read()
            .unwrap()
            .iter()
            .filter_map(|c| match c {
                MockApiCall::Register { record } => Some(record.clone()),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: MockApiCall) -> usize {
        let mut calls = self.calls.write().unwrap();
        calls.push(call);
        calls.len()
    }

    async fn wait(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    fn find_known(&self, field_type: FieldType, value: &str) -> Option<String> {
        let needle = value.trim().to_lowercase();
        self.known_values
            .read()
            .unwrap()
            .get(&field_type)?
            .iter()
            .find(|v| v.to_lowercase() == needle)
            .cloned()
    }
}

#[async_trait]
impl FederationApi for MockApi {
    async fn dynamic_options(&self, field_type: FieldType) -> Result<Vec<String>> {
        self.record(MockApiCall::DynamicOptions { field_type });
        self.wait().await;

        if let Some(failure) = self.option_failures.read().unwrap().get(&field_type) {
            return Err(failure.to_error());
        }
        Ok(self
            .options
            .read()
            .unwrap()
            .get(&field_type)
            .cloned()
            .unwrap_or_default())
    }

    async fn validate_custom_field(
        &self,
        field_type: FieldType,
        value: &str,
    ) -> Result<CustomFieldCheck> {
        self.record(MockApiCall::ValidateCustomField {
            field_type,
            value: value.to_string(),
        });
        self.wait().await;

        Ok(match self.find_known(field_type, value) {
            Some(existing) => CustomFieldCheck {
                is_duplicate: true,
                message: format!("'{existing}' already exists."),
                suggested_value: Some(existing),
                match_type: Some("case_insensitive".into()),
                source: Some("custom".into()),
            },
            None => CustomFieldCheck {
                is_duplicate: false,
                suggested_value: None,
                message: String::new(),
                match_type: None,
                source: None,
            },
        })
    }

    async fn add_custom_field(
        &self,
        field_type: FieldType,
        value: &str,
    ) -> Result<CustomFieldAdded> {
        self.record(MockApiCall::AddCustomField {
            field_type,
            value: value.to_string(),
        });
        self.wait().await;

        let existing = self.find_known(field_type, value);
        let was_new = existing.is_none();
        let stored = existing.unwrap_or_else(|| value.to_string());
        if was_new {
            self.known_values
                .write()
                .unwrap()
                .entry(field_type)
                .or_default()
                .push(stored.clone());
        }

        let now = Utc::now();
        Ok(CustomFieldAdded {
            success: true,
            message: String::new(),
            field: Some(CustomFieldEntry {
                field_type,
                value: stored,
                first_used_at: Some(now),
                last_used_at: Some(now),
                usage_count: 1,
            }),
            was_new,
        })
    }

    async fn submit_registration(&self, payload: SubmissionPayload) -> Result<QuickRegistration> {
        let data = match &payload {
            SubmissionPayload::Json(value) => value.clone(),
            SubmissionPayload::Multipart { fields, .. } => Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect::<Map<_, _>>(),
            ),
        };
        let n = self.record(MockApiCall::SubmitRegistration { payload });
        self.wait().await;

        if let Some(failure) = self.registration_failure.read().unwrap().as_ref() {
            return Err(failure.to_error());
        }
        Ok(QuickRegistration {
            registration_code: format!("REG-{n:05}"),
            data,
        })
    }

    async fn register(&self, record: &RegistrantRecord) -> Result<AuthSession> {
        let n = self.record(MockApiCall::Register {
            record: record.to_json(),
        });
        self.wait().await;

        if let Some(failure) = self.registration_failure.read().unwrap().as_ref() {
            return Err(failure.to_error());
        }
        let email = record.get_str("email").unwrap_or_default();
        Ok(AuthSession {
            token: format!("mock-token-{n}"),
            user: AuthUser {
                id: n as u64,
                name: record.get_str("full_name").unwrap_or_else(|| email.clone()),
                email,
                role: record.get_str("role"),
            },
        })
    }

    async fn create_invitation(&self, request: &InvitationRequest) -> Result<Invitation> {
        let id = self.record(MockApiCall::CreateInvitation {
            request: request.clone(),
        }) as u64;
        self.wait().await;

        let name_of = |entity_type, id| {
            self.entities
                .read()
                .unwrap()
                .iter()
                .find(|e| e.entity.entity_type == entity_type && e.entity.id == id)
                .map(|e| e.entity.name.clone())
                .unwrap_or_default()
        };

        Ok(Invitation {
            id,
            status: InvitationStatus::Pending,
            sender: EntityRef::new(
                request.sender_type,
                request.sender_id,
                name_of(request.sender_type, request.sender_id),
            ),
            receiver: EntityRef::new(
                request.receiver_type,
                request.receiver_id,
                name_of(request.receiver_type, request.receiver_id),
            ),
            message: request.message.clone(),
            expires_at: request.expires_at,
            created_at: Some(Utc::now()),
        })
    }

    async fn available_entities(&self) -> Result<AvailableEntities> {
        self.record(MockApiCall::AvailableEntities);
        self.wait().await;
        Ok(AvailableEntities {
            entities: self.entities.read().unwrap().clone(),
        })
    }
}
