//! Table-tennis federation registration client.
//!
//! Role-conditional, multi-step registration forms for leagues, clubs and
//! members: schema validation, a step machine, the shared equipment
//! catalog, and the adapter that sends the finished record to the
//! federation REST API.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use federation_client::{ApiClient, ClientConfig, FieldCatalog, Flow, FormMachine, SubmissionAdapter};
//!
//! let config = ClientConfig::from_env()?;
//! let api = Arc::new(ApiClient::new(&config)?);
//! let catalog = Arc::new(FieldCatalog::from_config(api.clone(), &config));
//! let adapter = SubmissionAdapter::from_config(api.clone(), &config);
//!
//! let mut form = FormMachine::new(Flow::SignUp);
//! form.set_field("role", "club-admin")?;
//! form.next()?;
//! // ... fill in details ...
//! let receipt = adapter.submit_form(&mut form, None).await?;
//! if let Some(user) = &receipt.user {
//!     println!("Signed up as {}", user.email);
//! }
//! ```
//!
//! # Modules
//!
//! - [`schema`] - Discriminant profiles and field rules
//! - [`form`] - Step machine driving a single registration
//! - [`catalog`] - Cached, rate-limited equipment option lists
//! - [`submission`] - Attachment guard and payload encoding
//! - [`transport`] - HTTP implementation of [`FederationApi`]
//! - [`invitation`] - Invitations between entities
//! - [`testing`] - Mock implementations for testing

pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod form;
pub mod invitation;
pub mod record;
pub mod schema;
pub mod session;
pub mod submission;
pub mod testing;
pub mod transport;
pub mod types;

pub use api::FederationApi;
pub use catalog::{CatalogOptions, FetchOptions, FieldCatalog, OptionsOrigin};
pub use config::ClientConfig;
pub use error::{FederationError, FieldError, Result, ValidationErrors};
pub use form::{ClubReference, Flow, FormMachine, FormState, ReferenceData, Step, TransitionError};
pub use invitation::{
    AvailableEntities, AvailableEntity, EntityRef, Invitation, InvitationDraft, InvitationRequest,
    InvitationStatus,
};
pub use record::RegistrantRecord;
pub use schema::Schema;
pub use session::{MemorySessionStore, SessionStore};
pub use submission::{
    Attachment, AttachmentPolicy, ErrorReport, FailureKind, SubmissionAdapter, SubmissionPayload,
};
pub use transport::ApiClient;
pub use types::{
    AdminDeletion, AuthSession, AuthUser, Credentials, CustomFieldAdded, CustomFieldCheck,
    Discriminant, FieldType, RegistrationReceipt,
};

// Re-export testing utilities
pub use testing::{MockApi, MockApiCall, MockFailure};
