//! Discriminant profiles: which fields each role or entity type requires and
//! which fields are derived from others.
//!
//! Adding a discriminant means adding a row to [`PROFILES`].

use super::rules::{Check, FieldRule};
use crate::types::{Discriminant, FieldType};

/// Sentinel brand value that switches a slot to free-text brand/model fields.
pub const CUSTOM_BRAND: &str = "custom";

pub const GENDERS: &[&str] = &["male", "female"];
pub const RUBBER_TYPES: &[&str] = &["smooth", "short_pips", "long_pips", "anti_spin"];

/// A field filled in automatically from a reference table when `source` changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedField {
    pub source: &'static str,
    pub target: &'static str,
}

/// One piece of equipment with a brand/model pair and custom fallbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EquipmentSlot {
    pub name: &'static str,
    pub brand_field: &'static str,
    pub model_field: &'static str,
    pub custom_brand_field: &'static str,
    pub custom_model_field: &'static str,
    pub brand_catalog: FieldType,
    pub model_catalog: FieldType,
}

pub const EQUIPMENT_SLOTS: [EquipmentSlot; 3] = [
    EquipmentSlot {
        name: "racket",
        brand_field: "racket_brand",
        model_field: "racket_model",
        custom_brand_field: "racket_custom_brand",
        custom_model_field: "racket_custom_model",
        brand_catalog: FieldType::RacketBrand,
        model_catalog: FieldType::RacketModel,
    },
    EquipmentSlot {
        name: "drive_rubber",
        brand_field: "drive_rubber_brand",
        model_field: "drive_rubber_model",
        custom_brand_field: "drive_rubber_custom_brand",
        custom_model_field: "drive_rubber_custom_model",
        brand_catalog: FieldType::RubberBrand,
        model_catalog: FieldType::RubberModel,
    },
    EquipmentSlot {
        name: "backhand_rubber",
        brand_field: "backhand_rubber_brand",
        model_field: "backhand_rubber_model",
        custom_brand_field: "backhand_rubber_custom_brand",
        custom_model_field: "backhand_rubber_custom_model",
        brand_catalog: FieldType::RubberBrand,
        model_catalog: FieldType::RubberModel,
    },
];

impl EquipmentSlot {
    /// Catalog behind one of this slot's select fields.
    pub fn catalog_for(&self, field: &str) -> Option<FieldType> {
        if field == self.brand_field {
            Some(self.brand_catalog)
        } else if field == self.model_field {
            Some(self.model_catalog)
        } else {
            None
        }
    }
}

/// The catalog a brand or model select draws its options from.
pub fn catalog_for_field(field: &str) -> Option<FieldType> {
    EQUIPMENT_SLOTS.iter().find_map(|slot| slot.catalog_for(field))
}

/// The slot whose brand field is `field`, if any.
pub fn slot_for_brand(field: &str) -> Option<&'static EquipmentSlot> {
    EQUIPMENT_SLOTS.iter().find(|s| s.brand_field == field)
}

/// Rules and derived fields for one discriminant.
#[derive(Debug, Clone, Copy)]
pub struct Profile {
    pub discriminant: Discriminant,
    pub rules: &'static [FieldRule],
    pub derived: &'static [DerivedField],
}

/// Account fields shared by every sign-up role.
pub const ACCOUNT_RULES: &[FieldRule] = &[
    FieldRule::new("email", "email", &[Check::Required, Check::Email]),
    FieldRule::new("password", "password", &[Check::Required, Check::MinLength(8)]),
    FieldRule::new(
        "password_confirmation",
        "password confirmation",
        &[Check::Required, Check::SameAs("password")],
    ),
    FieldRule::new("phone", "phone", &[Check::Required]),
    FieldRule::new("country", "country", &[Check::Required]),
];

const LEAGUE_RULES: &[FieldRule] = &[
    FieldRule::new("league_name", "league name", &[Check::Required]),
    FieldRule::new("province", "province", &[Check::Required]),
    FieldRule::new("city", "city", &[Check::Required]),
];

const CLUB_RULES: &[FieldRule] = &[
    FieldRule::new("club_name", "club name", &[Check::Required]),
    FieldRule::new("parent_league_id", "league", &[Check::Required]),
    FieldRule::new("city", "city", &[Check::Required]),
    FieldRule::new("address", "address", &[Check::Required]),
];

const MEMBER_RULES: &[FieldRule] = &[
    FieldRule::new("full_name", "full name", &[Check::Required]),
    FieldRule::new("parent_club_id", "club", &[Check::Required]),
    FieldRule::new("birth_date", "birth date", &[Check::Required, Check::Date]),
    FieldRule::new("gender", "gender", &[Check::Required, Check::OneOf(GENDERS)]),
    FieldRule::new(
        "rubber_type",
        "rubber type",
        &[Check::Required, Check::OneOf(RUBBER_TYPES)],
    ),
    FieldRule::new("racket_custom_brand", "custom racket brand", &[Check::Required])
        .when("racket_brand", CUSTOM_BRAND),
    FieldRule::new("racket_custom_model", "custom racket model", &[Check::Required])
        .when("racket_brand", CUSTOM_BRAND),
    FieldRule::new(
        "drive_rubber_custom_brand",
        "custom forehand rubber brand",
        &[Check::Required],
    )
    .when("drive_rubber_brand", CUSTOM_BRAND),
    FieldRule::new(
        "drive_rubber_custom_model",
        "custom forehand rubber model",
        &[Check::Required],
    )
    .when("drive_rubber_brand", CUSTOM_BRAND),
    FieldRule::new(
        "backhand_rubber_custom_brand",
        "custom backhand rubber brand",
        &[Check::Required],
    )
    .when("backhand_rubber_brand", CUSTOM_BRAND),
    FieldRule::new(
        "backhand_rubber_custom_model",
        "custom backhand rubber model",
        &[Check::Required],
    )
    .when("backhand_rubber_brand", CUSTOM_BRAND),
];

/// Optional member fields shown by the forms but never required.
pub const MEMBER_OPTIONAL_FIELDS: &[&str] = &[
    "federation_name",
    "racket_brand",
    "racket_model",
    "drive_rubber_brand",
    "drive_rubber_model",
    "drive_rubber_hardness",
    "backhand_rubber_brand",
    "backhand_rubber_model",
    "backhand_rubber_hardness",
    "photo",
];

pub const PROFILES: &[Profile] = &[
    Profile {
        discriminant: Discriminant::League,
        rules: LEAGUE_RULES,
        derived: &[],
    },
    Profile {
        discriminant: Discriminant::Club,
        rules: CLUB_RULES,
        derived: &[DerivedField {
            source: "parent_league_id",
            target: "parent_league_name",
        }],
    },
    Profile {
        discriminant: Discriminant::Member,
        rules: MEMBER_RULES,
        derived: &[DerivedField {
            source: "parent_club_id",
            target: "federation_name",
        }],
    },
];
