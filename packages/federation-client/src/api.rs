//! The seam between the form pipeline and the federation REST API.

use async_trait::async_trait;

use crate::error::Result;
use crate::invitation::{AvailableEntities, Invitation, InvitationRequest};
use crate::record::RegistrantRecord;
use crate::submission::SubmissionPayload;
use crate::types::{
    AuthSession, CustomFieldAdded, CustomFieldCheck, FieldType, QuickRegistration,
};

/// Federation API operations used by the catalog resolver, the submission
/// adapter and invitations.
///
/// [`crate::ApiClient`] is the HTTP implementation;
/// [`crate::testing::MockApi`] records calls for tests.
#[async_trait]
pub trait FederationApi: Send + Sync {
    /// `GET /api/dynamic-options/{fieldType}`
    async fn dynamic_options(&self, field_type: FieldType) -> Result<Vec<String>>;

    /// `POST /api/validate-custom-field`
    async fn validate_custom_field(
        &self,
        field_type: FieldType,
        value: &str,
    ) -> Result<CustomFieldCheck>;

    /// `POST /api/add-custom-field`
    async fn add_custom_field(&self, field_type: FieldType, value: &str)
        -> Result<CustomFieldAdded>;

    /// `POST /api/registro-rapido`
    async fn submit_registration(&self, payload: SubmissionPayload) -> Result<QuickRegistration>;

    /// `POST /api/auth/register`. Implementations keep the returned token
    /// as the session.
    async fn register(&self, record: &RegistrantRecord) -> Result<AuthSession>;

    /// `POST /api/invitations`
    async fn create_invitation(&self, request: &InvitationRequest) -> Result<Invitation>;

    /// `GET /api/invitations/available-entities`
    async fn available_entities(&self) -> Result<AvailableEntities>;
}
