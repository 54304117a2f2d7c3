//! Wire and domain types shared across the client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::FederationError;

/// The value that decides which fields a registrant record must carry.
///
/// Sign-up sends roles (`league-admin`, `club-admin`, `member`); entity
/// registration sends entity types (`league`, `club`, `member`). Both map
/// onto the same three profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Discriminant {
    League,
    Club,
    Member,
}

impl Discriminant {
    pub const ALL: [Discriminant; 3] = [Self::League, Self::Club, Self::Member];

    /// Entity-type wire value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::League => "league",
            Self::Club => "club",
            Self::Member => "member",
        }
    }

    /// Sign-up role wire value.
    pub fn role_str(&self) -> &'static str {
        match self {
            Self::League => "league-admin",
            Self::Club => "club-admin",
            Self::Member => "member",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::League => "League",
            Self::Club => "Club",
            Self::Member => "Member",
        }
    }
}

impl fmt::Display for Discriminant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Discriminant {
    type Err = FederationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "league" | "league-admin" | "league_admin" => Ok(Self::League),
            "club" | "club-admin" | "club_admin" => Ok(Self::Club),
            "member" => Ok(Self::Member),
            other => Err(FederationError::Parse(format!(
                "unknown role or entity type '{other}'"
            ))),
        }
    }
}

/// Recognized keys of the dynamic option catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    RacketBrand,
    RacketModel,
    RubberBrand,
    RubberModel,
    RubberHardness,
}

impl FieldType {
    pub const ALL: [FieldType; 5] = [
        Self::RacketBrand,
        Self::RacketModel,
        Self::RubberBrand,
        Self::RubberModel,
        Self::RubberHardness,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RacketBrand => "racket_brand",
            Self::RacketModel => "racket_model",
            Self::RubberBrand => "rubber_brand",
            Self::RubberModel => "rubber_model",
            Self::RubberHardness => "rubber_hardness",
        }
    }

    /// Built-in options, always offered ahead of learned values.
    pub fn predefined(&self) -> &'static [&'static str] {
        match self {
            Self::RacketBrand | Self::RubberBrand => &[
                "Butterfly", "DHS", "Donic", "Joola", "Nittaku", "Stiga", "Tibhar", "Xiom",
                "Yasaka",
            ],
            Self::RacketModel => &[
                "Viscaria",
                "Timo Boll ALC",
                "Korbel",
                "Clipper Wood",
                "Hurricane Long 5",
                "Ma Lin Extra Offensive",
            ],
            Self::RubberModel => &[
                "Tenergy 05",
                "Dignics 09C",
                "Hurricane 3",
                "Rakza 7",
                "Evolution MX-P",
                "Mark V",
            ],
            Self::RubberHardness => &["Soft", "Medium", "Hard", "Extra hard"],
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = FederationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldType::ALL
            .into_iter()
            .find(|ft| ft.as_str() == s.trim())
            .ok_or_else(|| FederationError::Parse(format!("unknown field type '{s}'")))
    }
}

// =============================================================================
// Custom field catalog
// =============================================================================

/// Request body for both custom-field endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct CustomFieldRequest<'a> {
    pub field_type: FieldType,
    pub value: &'a str,
}

/// Response of `POST /api/validate-custom-field`.
#[derive(Debug, Clone, Deserialize)]
pub struct CustomFieldCheck {
    pub is_duplicate: bool,
    pub suggested_value: Option<String>,
    #[serde(default)]
    pub message: String,
    pub match_type: Option<String>,
    pub source: Option<String>,
}

/// A user-contributed catalog value with its usage metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomFieldEntry {
    pub field_type: FieldType,
    pub value: String,
    pub first_used_at: Option<DateTime<Utc>>,
    pub last_used_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub usage_count: u32,
}

/// Response of `POST /api/add-custom-field`.
#[derive(Debug, Clone, Deserialize)]
pub struct CustomFieldAdded {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    pub field: Option<CustomFieldEntry>,
    #[serde(default)]
    pub was_new: bool,
}

// =============================================================================
// Registration & auth
// =============================================================================

/// Response of `POST /api/registro-rapido`.
#[derive(Debug, Clone, Deserialize)]
pub struct QuickRegistration {
    pub registration_code: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// What the caller gets back from a successful submission.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationReceipt {
    /// Issued by quick registration; account sign-ups get none
    pub registration_code: Option<String>,
    /// The account created by a sign-up
    pub user: Option<AuthUser>,
    pub record: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub role: Option<String>,
}

/// Login / register response.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSession {
    pub token: String,
    pub user: AuthUser,
}

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Acknowledgement from the admin deletion endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminDeletion {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub deleted: serde_json::Value,
}

/// Envelope used by endpoints that wrap their payload in `data`.
#[derive(Debug, Clone, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}
