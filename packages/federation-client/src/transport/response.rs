//! Mapping of non-2xx responses into [`FederationError`].

use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::{FederationError, ValidationErrors};

/// Key used for validation messages not tied to a field.
pub const GENERAL_FIELD: &str = "_general";

/// Laravel-style error body: `{ "message": "...", "errors": { "field": ["..."] } }`.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errors: IndexMap<String, FieldMessages>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FieldMessages {
    Many(Vec<String>),
    One(String),
}

/// Tag a failed response. `sign_in_required` is only consulted for 401.
pub fn map_status(status: u16, body: &str, sign_in_required: bool) -> FederationError {
    let parsed: Option<ErrorBody> = serde_json::from_str(body).ok();
    let message = parsed
        .as_ref()
        .and_then(|b| b.message.clone())
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| body.trim().to_string());

    match status {
        401 => FederationError::Unauthorized { sign_in_required },
        419 => FederationError::CsrfMismatch,
        422 => FederationError::Validation(validation_errors(parsed.unwrap_or_default(), message)),
        429 => FederationError::RateLimited(message),
        500..=599 => FederationError::Server { status, message },
        _ => FederationError::Api { status, message },
    }
}

fn validation_errors(body: ErrorBody, message: String) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    for (field, messages) in body.errors {
        match messages {
            FieldMessages::Many(list) => {
                for m in list {
                    errors.push(field.clone(), m);
                }
            }
            FieldMessages::One(m) => errors.push(field, m),
        }
    }
    if errors.is_empty() && !message.is_empty() {
        errors.push(GENERAL_FIELD, message);
    }
    errors
}
