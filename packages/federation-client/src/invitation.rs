//! Invitations between leagues, clubs and members.
//!
//! A draft lives only in the UI until it is submitted once; the API owns
//! every persisted invitation and its status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::FederationApi;
use crate::error::{FederationError, Result, ValidationErrors};
use crate::types::Discriminant;

pub const MAX_MESSAGE_CHARS: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    pub entity_type: Discriminant,
    pub id: u64,
    #[serde(default)]
    pub name: String,
}

impl EntityRef {
    pub fn new(entity_type: Discriminant, id: u64, name: impl Into<String>) -> Self {
        Self {
            entity_type,
            id,
            name: name.into(),
        }
    }

    pub fn same_entity(&self, other: &EntityRef) -> bool {
        self.entity_type == other.entity_type && self.id == other.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Rejected,
    Expired,
}

/// A persisted invitation as returned by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct Invitation {
    pub id: u64,
    pub status: InvitationStatus,
    pub sender: EntityRef,
    pub receiver: EntityRef,
    pub message: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Body of `POST /api/invitations`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvitationRequest {
    pub sender_type: Discriminant,
    pub sender_id: u64,
    pub receiver_type: Discriminant,
    pub receiver_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct InvitationDraft {
    pub sender: EntityRef,
    pub receiver: EntityRef,
    pub message: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl InvitationDraft {
    pub fn new(sender: EntityRef, receiver: EntityRef) -> Self {
        Self {
            sender,
            receiver,
            message: String::new(),
            expires_at: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn expiring_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn validate(&self, now: DateTime<Utc>) -> std::result::Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.sender.same_entity(&self.receiver) {
            errors.push("receiver", "An entity cannot invite itself.");
        }
        if self.message.chars().count() > MAX_MESSAGE_CHARS {
            errors.push(
                "message",
                format!("The message may not be greater than {MAX_MESSAGE_CHARS} characters."),
            );
        }
        if let Some(expires_at) = self.expires_at {
            if expires_at <= now {
                errors.push("expires_at", "The expiry must be a date in the future.");
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn to_request(&self) -> InvitationRequest {
        let message = self.message.trim();
        InvitationRequest {
            sender_type: self.sender.entity_type,
            sender_id: self.sender.id,
            receiver_type: self.receiver.entity_type,
            receiver_id: self.receiver.id,
            message: (!message.is_empty()).then(|| message.to_string()),
            expires_at: self.expires_at,
        }
    }

    /// Validate and send the draft. The draft is consumed either way.
    pub async fn submit(self, api: &dyn FederationApi) -> Result<Invitation> {
        self.validate(Utc::now()).map_err(FederationError::Validation)?;
        let request = self.to_request();
        tracing::info!(
            sender = %self.sender.name,
            receiver = %self.receiver.name,
            "Sending invitation"
        );
        api.create_invitation(&request).await
    }
}

/// An entity the current user could invite.
#[derive(Debug, Clone, Deserialize)]
pub struct AvailableEntity {
    #[serde(flatten)]
    pub entity: EntityRef,
    pub city: Option<String>,
    #[serde(default)]
    pub has_pending_invitation: bool,
}

/// Response of `GET /api/invitations/available-entities`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AvailableEntities {
    #[serde(default)]
    pub entities: Vec<AvailableEntity>,
}

impl AvailableEntities {
    /// Entities `sender` may invite now: not itself, nothing pending, and
    /// optionally only one entity type.
    pub fn invitable_from(
        &self,
        sender: &EntityRef,
        entity_type: Option<Discriminant>,
    ) -> Vec<&AvailableEntity> {
        self.entities
            .iter()
            .filter(|e| !e.entity.same_entity(sender))
            .filter(|e| !e.has_pending_invitation)
            .filter(|e| entity_type.map_or(true, |t| e.entity.entity_type == t))
            .collect()
    }
}
