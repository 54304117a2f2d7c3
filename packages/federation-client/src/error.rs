//! Typed errors for the federation client.
//!
//! Every failure crossing the transport boundary is tagged here so callers
//! match on a closed set instead of probing response bodies.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for federation client operations.
pub type Result<T> = std::result::Result<T, FederationError>;

/// Errors produced by the federation client.
#[derive(Debug, Error)]
pub enum FederationError {
    /// Field-level validation failed, locally or as reported by the API (422)
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    /// Attachment rejected before transmission (size or type)
    #[error("attachment rejected: {0}")]
    Attachment(String),

    /// Backing service signalled rate limiting (429)
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Session missing or expired (401)
    #[error("unauthorized")]
    Unauthorized {
        /// Whether the UI should send the user to the sign-in view
        sign_in_required: bool,
    },

    /// CSRF token mismatch that survived one refresh-and-retry (419)
    #[error("CSRF token mismatch")]
    CsrfMismatch,

    /// Server-side failure (5xx)
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// Any other non-2xx response
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Connection failed, timed out, or the body could not be read
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Response body did not match the expected shape
    #[error("parse error: {0}")]
    Parse(String),

    /// Missing or invalid configuration
    #[error("config error: {0}")]
    Config(String),

    /// The operation was superseded or its consumer went away
    #[error("operation cancelled")]
    Cancelled,
}

impl FederationError {
    /// True for failures where the caller may reasonably resubmit later.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimited(_) | Self::Server { .. } | Self::Network(_) | Self::CsrfMismatch
        )
    }
}

impl From<ValidationErrors> for FederationError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

/// A single failing rule on a single field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// All field errors from one validation pass, in rule order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    /// Names of the failing fields, without repeats.
    pub fn fields(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for error in &self.errors {
            if !seen.contains(&error.field.as_str()) {
                seen.push(&error.field);
            }
        }
        seen
    }

    pub fn contains_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// Messages grouped per field, preserving first-seen field order.
    pub fn by_field(&self) -> IndexMap<String, Vec<String>> {
        let mut grouped: IndexMap<String, Vec<String>> = IndexMap::new();
        for error in &self.errors {
            grouped
                .entry(error.field.clone())
                .or_default()
                .push(error.message.clone());
        }
        grouped
    }

    /// Keep only errors whose field is in `fields`.
    pub fn retain_fields(&mut self, fields: &[&str]) {
        self.errors.retain(|e| fields.contains(&e.field.as_str()));
    }

    /// Single user-facing line joining every message.
    pub fn joined(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub(crate) fn into_result(self) -> std::result::Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl FromIterator<FieldError> for ValidationErrors {
    fn from_iter<I: IntoIterator<Item = FieldError>>(iter: I) -> Self {
        Self {
            errors: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ValidationErrors {
    type Item = FieldError;
    type IntoIter = std::vec::IntoIter<FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_by_field_groups_in_first_seen_order() {
        let mut errors = ValidationErrors::new();
        errors.push("email", "The email is invalid.");
        errors.push("password", "Too short.");
        errors.push("email", "Already taken.");

        let grouped = errors.by_field();
        let keys: Vec<&String> = grouped.keys().collect();
        assert_eq!(keys, vec!["email", "password"]);
        assert_eq!(grouped["email"].len(), 2);
        assert_eq!(errors.fields(), vec!["email", "password"]);
    }

    #[test]
    fn test_retain_fields() {
        let mut errors = ValidationErrors::new();
        errors.push("role", "Pick a role.");
        errors.push("city", "Required.");
        errors.retain_fields(&["role"]);
        assert_eq!(errors.len(), 1);
        assert!(errors.contains_field("role"));
    }

    #[test]
    fn test_transient_classification() {
        assert!(FederationError::RateLimited("slow down".into()).is_transient());
        assert!(!FederationError::Cancelled.is_transient());
        assert!(!FederationError::Unauthorized {
            sign_in_required: true
        }
        .is_transient());
    }
}
