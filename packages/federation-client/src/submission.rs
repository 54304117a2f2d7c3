//! Submission adapter: attachment guard, payload encoding and mapping of
//! transport failures into reports the UI can show.

use indexmap::IndexMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::api::FederationApi;
use crate::config::{ClientConfig, DEFAULT_MAX_ATTACHMENT_BYTES};
use crate::error::{FederationError, ValidationErrors};
use crate::form::{Flow, FormMachine, TransitionError};
use crate::record::RegistrantRecord;
use crate::transport::GENERAL_FIELD;
use crate::types::RegistrationReceipt;

pub const ALLOWED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];

/// Field names whose server-side errors are about the equipment photo.
const PHOTO_FIELDS: &[&str] = &["photo", "equipment_photo", "racket_photo"];

/// Words that tie a field-less server message to the photo.
const PHOTO_WORDS: &[&str] = &["photo", "image", "foto", "imagen"];

pub const EMAIL_TAKEN_MESSAGE: &str =
    "This email is already registered. Sign in instead or use a different email.";
pub const PHOTO_REJECTED_MESSAGE: &str =
    "The equipment photo was rejected or has already been uploaded. Choose a different JPEG, PNG, GIF or WebP image of your racket.";
pub const SERVER_ERROR_MESSAGE: &str = "The server had a problem. Please try again later.";
pub const GENERIC_FAILURE_MESSAGE: &str = "The registration could not be sent. Please try again.";
pub const SIGN_UP_ATTACHMENT_MESSAGE: &str = "Account sign-up does not take an attachment.";

/// A binary file sent alongside the record.
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    /// Multipart field name
    pub field: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn photo(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            field: "photo".to_string(),
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct AttachmentPolicy {
    pub max_bytes: usize,
    pub allowed_types: &'static [&'static str],
}

impl Default for AttachmentPolicy {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_ATTACHMENT_BYTES,
            allowed_types: ALLOWED_IMAGE_TYPES,
        }
    }
}

impl AttachmentPolicy {
    pub fn check(&self, attachment: &Attachment) -> Result<(), FederationError> {
        if attachment.len() > self.max_bytes {
            return Err(FederationError::Attachment(format!(
                "The image is {} but may not be larger than {}.",
                megabytes(attachment.len()),
                megabytes(self.max_bytes)
            )));
        }
        let content_type = attachment.content_type.trim().to_ascii_lowercase();
        if !self.allowed_types.contains(&content_type.as_str()) {
            return Err(FederationError::Attachment(format!(
                "Images of type '{}' are not accepted; use JPEG, PNG, GIF or WebP.",
                attachment.content_type
            )));
        }
        Ok(())
    }
}

fn megabytes(bytes: usize) -> String {
    format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
}

/// What goes over the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionPayload {
    /// Structured body, native types preserved.
    Json(serde_json::Value),
    /// Flattened string fields plus the file.
    Multipart {
        fields: Vec<(String, String)>,
        attachment: Attachment,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Record or server-side field validation failed
    Validation,
    /// Attachment rejected before sending
    Attachment,
    /// Session expired
    Unauthorized,
    /// Server error; retrying later may work
    Server,
    /// Anything else on the way to or from the API
    Transport,
}

/// A failed submission, ready to show: one message plus per-field detail.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ErrorReport {
    pub kind: FailureKind,
    pub message: String,
    pub fields: IndexMap<String, Vec<String>>,
}

impl ErrorReport {
    fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            fields: IndexMap::new(),
        }
    }

    fn from_validation(errors: &ValidationErrors) -> Self {
        let fields = errors.by_field();

        let email_taken = fields.get("email").is_some_and(|messages| {
            messages.iter().any(|m| {
                let m = m.to_lowercase();
                m.contains("taken") || m.contains("already") || m.contains("exists")
            })
        });
        let photo_rejected = fields.iter().any(|(field, messages)| {
            PHOTO_FIELDS.contains(&field.as_str())
                || (field == GENERAL_FIELD && messages.iter().any(|m| mentions_photo(m)))
        });

        let message = if email_taken {
            EMAIL_TAKEN_MESSAGE.to_string()
        } else if photo_rejected {
            PHOTO_REJECTED_MESSAGE.to_string()
        } else {
            format!("Please correct the following: {}", errors.joined())
        };

        Self {
            kind: FailureKind::Validation,
            message,
            fields,
        }
    }

    pub fn field_messages(&self, field: &str) -> &[String] {
        self.fields.get(field).map_or(&[], Vec::as_slice)
    }
}

fn mentions_photo(message: &str) -> bool {
    let message = message.to_lowercase();
    PHOTO_WORDS.iter().any(|word| message.contains(word))
}

impl From<FederationError> for ErrorReport {
    fn from(error: FederationError) -> Self {
        match error {
            FederationError::Validation(errors) => Self::from_validation(&errors),
            FederationError::Attachment(message) => Self::new(FailureKind::Attachment, message),
            FederationError::Unauthorized { .. } => Self::new(
                FailureKind::Unauthorized,
                "Your session has expired. Please sign in again.",
            ),
            FederationError::Server { .. } => Self::new(FailureKind::Server, SERVER_ERROR_MESSAGE),
            other => {
                warn!(error = %other, "Submission failed");
                Self::new(FailureKind::Transport, GENERIC_FAILURE_MESSAGE)
            }
        }
    }
}

impl From<ValidationErrors> for ErrorReport {
    fn from(errors: ValidationErrors) -> Self {
        Self::from_validation(&errors)
    }
}

pub struct SubmissionAdapter {
    api: Arc<dyn FederationApi>,
    policy: AttachmentPolicy,
}

impl SubmissionAdapter {
    pub fn new(api: Arc<dyn FederationApi>) -> Self {
        Self {
            api,
            policy: AttachmentPolicy::default(),
        }
    }

    pub fn from_config(api: Arc<dyn FederationApi>, config: &ClientConfig) -> Self {
        Self::new(api).with_policy(AttachmentPolicy {
            max_bytes: config.max_attachment_bytes,
            ..AttachmentPolicy::default()
        })
    }

    pub fn with_policy(mut self, policy: AttachmentPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &AttachmentPolicy {
        &self.policy
    }

    /// Check the attachment and encode the record. Never touches the network.
    pub fn prepare(
        &self,
        record: &RegistrantRecord,
        attachment: Option<Attachment>,
    ) -> Result<SubmissionPayload, FederationError> {
        match attachment {
            Some(attachment) => {
                self.policy.check(&attachment)?;
                let fields = record
                    .flatten()
                    .into_iter()
                    .filter(|(name, _)| *name != attachment.field)
                    .collect();
                Ok(SubmissionPayload::Multipart { fields, attachment })
            }
            None => Ok(SubmissionPayload::Json(record.to_json())),
        }
    }

    /// Send one registration. No retries; the caller decides whether to
    /// resubmit and is responsible for keeping the registration code.
    pub async fn submit(
        &self,
        record: &RegistrantRecord,
        attachment: Option<Attachment>,
    ) -> Result<RegistrationReceipt, ErrorReport> {
        let payload = self.prepare(record, attachment)?;
        let multipart = matches!(payload, SubmissionPayload::Multipart { .. });

        let registration = self.api.submit_registration(payload).await?;
        info!(
            registration_code = %registration.registration_code,
            multipart,
            "Registration submitted"
        );

        Ok(RegistrationReceipt {
            registration_code: Some(registration.registration_code),
            user: None,
            record: registration.data,
        })
    }

    /// Create an account from a sign-up record. The API keeps the session
    /// token; the receipt carries the new user.
    pub async fn register(
        &self,
        record: &RegistrantRecord,
    ) -> Result<RegistrationReceipt, ErrorReport> {
        let session = self.api.register(record).await?;
        info!(user_id = session.user.id, "Account registered");

        Ok(RegistrationReceipt {
            registration_code: None,
            user: Some(session.user),
            record: record.to_json(),
        })
    }

    /// Validate and submit a form from its final step, feeding the outcome
    /// back into the machine. Sign-ups create an account; census forms go
    /// through quick registration.
    pub async fn submit_form(
        &self,
        form: &mut FormMachine,
        attachment: Option<Attachment>,
    ) -> Result<RegistrationReceipt, ErrorReport> {
        let record = match form.prepare_submission() {
            Ok(record) => record,
            Err(TransitionError::Invalid(errors)) => {
                let report = ErrorReport::from(errors);
                form.fail(report.clone());
                return Err(report);
            }
            Err(other) => {
                return Err(ErrorReport::new(FailureKind::Validation, other.to_string()));
            }
        };

        let outcome = match (form.flow(), attachment) {
            (Flow::SignUp, Some(_)) => Err(ErrorReport::new(
                FailureKind::Attachment,
                SIGN_UP_ATTACHMENT_MESSAGE,
            )),
            (Flow::SignUp, None) => self.register(&record).await,
            (Flow::MemberCensus, attachment) => self.submit(&record, attachment).await,
        };

        match outcome {
            Ok(receipt) => {
                form.complete(receipt.clone());
                Ok(receipt)
            }
            Err(report) => {
                form.fail(report.clone());
                Err(report)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jpeg(size: usize) -> Attachment {
        Attachment::photo("racket.jpg", "image/jpeg", vec![0u8; size])
    }

    #[test]
    fn test_policy_rejects_oversized() {
        let err = AttachmentPolicy::default()
            .check(&jpeg(6 * 1024 * 1024))
            .unwrap_err();
        assert!(matches!(err, FederationError::Attachment(ref m) if m.contains("6.0 MB")));
    }

    #[test]
    fn test_policy_rejects_unknown_type() {
        let pdf = Attachment::photo("scan.pdf", "application/pdf", vec![1, 2, 3]);
        assert!(AttachmentPolicy::default().check(&pdf).is_err());
        let webp = Attachment::photo("racket.webp", "IMAGE/WEBP", vec![1, 2, 3]);
        assert!(AttachmentPolicy::default().check(&webp).is_ok());
    }

    #[test]
    fn test_email_taken_wording() {
        let mut errors = ValidationErrors::new();
        errors.push("email", "The email has already been taken.");
        errors.push("phone", "The phone field is required.");

        let report = ErrorReport::from(FederationError::Validation(errors));
        assert_eq!(report.kind, FailureKind::Validation);
        assert_eq!(report.message, EMAIL_TAKEN_MESSAGE);
        assert_eq!(report.field_messages("phone").len(), 1);
    }

    #[test]
    fn test_photo_wording() {
        let mut errors = ValidationErrors::new();
        errors.push("photo", "The photo has already been uploaded.");
        let report = ErrorReport::from(errors);
        assert_eq!(report.message, PHOTO_REJECTED_MESSAGE);
    }

    #[test]
    fn test_photo_wording_from_general_message() {
        let report = ErrorReport::from(crate::transport::map_status(
            422,
            r#"{"message":"La foto del equipo ya fue registrada."}"#,
            false,
        ));
        assert_eq!(report.message, PHOTO_REJECTED_MESSAGE);
        assert_eq!(report.field_messages(GENERAL_FIELD).len(), 1);

        let mut errors = ValidationErrors::new();
        errors.push(GENERAL_FIELD, "The given data was invalid.");
        assert_ne!(ErrorReport::from(errors).message, PHOTO_REJECTED_MESSAGE);
    }

    #[test]
    fn test_generic_validation_joins_messages() {
        let mut errors = ValidationErrors::new();
        errors.push("city", "The city field is required.");
        errors.push("address", "The address field is required.");
        let report = ErrorReport::from(errors);
        assert_eq!(
            report.message,
            "Please correct the following: The city field is required. The address field is required."
        );
    }

    #[test]
    fn test_server_and_transport_messages() {
        let report = ErrorReport::from(FederationError::Server {
            status: 500,
            message: "boom".into(),
        });
        assert_eq!(report.kind, FailureKind::Server);
        assert_eq!(report.message, SERVER_ERROR_MESSAGE);

        let report = ErrorReport::from(FederationError::Api {
            status: 404,
            message: "nope".into(),
        });
        assert_eq!(report.kind, FailureKind::Transport);
        assert_eq!(report.message, GENERIC_FAILURE_MESSAGE);
    }
}
