//! Role-conditional schema validation.
//!
//! A [`Schema`] is a discriminant field, a set of base rules that always
//! apply, and a profile table keyed by [`Discriminant`]. Validation runs
//! every applicable rule and never stops at the first failure.

pub mod profiles;
pub mod rules;

pub use profiles::{
    catalog_for_field, slot_for_brand, DerivedField, EquipmentSlot, Profile, CUSTOM_BRAND, EQUIPMENT_SLOTS,
    GENDERS, RUBBER_TYPES,
};
pub use rules::{is_valid_email, Check, Condition, FieldRule};

use crate::error::ValidationErrors;
use crate::record::RegistrantRecord;
use crate::types::Discriminant;
use profiles::{ACCOUNT_RULES, MEMBER_OPTIONAL_FIELDS, PROFILES};

#[derive(Debug, Clone, Copy)]
pub struct Schema {
    name: &'static str,
    discriminant_field: &'static str,
    base: &'static [FieldRule],
    profiles: &'static [Profile],
}

impl Schema {
    /// Account sign-up: account rules plus the role's profile.
    pub fn sign_up() -> Self {
        Self {
            name: "sign_up",
            discriminant_field: "role",
            base: ACCOUNT_RULES,
            profiles: PROFILES,
        }
    }

    /// Quick entity registration (league, club, member census): profile only.
    pub fn entity_registration() -> Self {
        Self {
            name: "entity_registration",
            discriminant_field: "role",
            base: &[],
            profiles: PROFILES,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn discriminant_field(&self) -> &'static str {
        self.discriminant_field
    }

    pub fn profile(&self, discriminant: Discriminant) -> Option<&'static Profile> {
        self.profiles.iter().find(|p| p.discriminant == discriminant)
    }

    /// Base rules followed by the discriminant's profile rules.
    pub fn rules(&self, discriminant: Discriminant) -> impl Iterator<Item = &'static FieldRule> {
        let profile_rules: &'static [FieldRule] =
            self.profile(discriminant).map_or(&[], |p| p.rules);
        self.base.iter().chain(profile_rules.iter())
    }

    pub fn derived_fields(&self, discriminant: Discriminant) -> &'static [DerivedField] {
        self.profile(discriminant).map_or(&[], |p| p.derived)
    }

    /// Validate `record` as a `discriminant` registrant.
    pub fn validate(
        &self,
        record: &RegistrantRecord,
        discriminant: Discriminant,
    ) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.profile(discriminant).is_none() {
            errors.push(
                self.discriminant_field,
                format!("{} registration is not supported.", discriminant.label()),
            );
        }
        for rule in self.rules(discriminant) {
            rule.evaluate(record, &mut errors);
        }
        errors.into_result()
    }

    /// Validate only the rules for `fields`.
    pub fn validate_fields(
        &self,
        record: &RegistrantRecord,
        discriminant: Discriminant,
        fields: &[&str],
    ) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        for rule in self.rules(discriminant).filter(|r| fields.contains(&r.field)) {
            rule.evaluate(record, &mut errors);
        }
        errors.into_result()
    }

    /// Read and check the discriminant selection itself.
    pub fn check_discriminant(
        &self,
        record: &RegistrantRecord,
    ) -> Result<Discriminant, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        match record.discriminant(self.discriminant_field) {
            Some(d) if self.profile(d).is_some() => return Ok(d),
            Some(d) => errors.push(
                self.discriminant_field,
                format!("{} registration is not supported.", d.label()),
            ),
            None if record.is_blank(self.discriminant_field) => {
                errors.push(self.discriminant_field, "Please select a role.")
            }
            None => errors.push(self.discriminant_field, "The selected role is invalid."),
        }
        Err(errors)
    }

    /// Validate a record that carries its own discriminant.
    pub fn validate_record(
        &self,
        record: &RegistrantRecord,
    ) -> Result<Discriminant, ValidationErrors> {
        let discriminant = self.check_discriminant(record)?;
        self.validate(record, discriminant)?;
        Ok(discriminant)
    }

    /// Every field a `discriminant` form can show: the discriminant, ruled
    /// fields, derived targets and optional extras.
    pub fn field_set(&self, discriminant: Discriminant) -> Vec<&'static str> {
        let mut fields = vec![self.discriminant_field];
        let mut push = |field: &'static str| {
            if !fields.contains(&field) {
                fields.push(field);
            }
        };
        for rule in self.rules(discriminant) {
            push(rule.field);
        }
        for derived in self.derived_fields(discriminant) {
            push(derived.source);
            push(derived.target);
        }
        if discriminant == Discriminant::Member {
            for field in MEMBER_OPTIONAL_FIELDS.iter().copied() {
                push(field);
            }
        }
        fields
    }

    /// Fields that are required unconditionally for `discriminant`.
    pub fn required_fields(&self, discriminant: Discriminant) -> Vec<&'static str> {
        self.rules(discriminant)
            .filter(|r| r.is_required() && r.when.is_none())
            .map(|r| r.field)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_member() -> RegistrantRecord {
        RegistrantRecord::new()
            .with("role", "member")
            .with("full_name", "Ana Torres")
            .with("parent_club_id", "12")
            .with("birth_date", "2008-05-14")
            .with("gender", "female")
            .with("rubber_type", "smooth")
    }

    #[test]
    fn test_club_missing_address_reports_only_address() {
        let record = RegistrantRecord::new()
            .with("role", "club")
            .with("club_name", "X")
            .with("parent_league_id", "1")
            .with("city", "Quito");

        let errors = Schema::entity_registration()
            .validate(&record, Discriminant::Club)
            .unwrap_err();

        assert_eq!(errors.len(), 1);
        assert_eq!(errors.fields(), vec!["address"]);
    }

    #[test]
    fn test_no_short_circuit() {
        let errors = Schema::sign_up()
            .validate(&RegistrantRecord::new(), Discriminant::League)
            .unwrap_err();
        // 5 account fields + 3 league fields
        assert_eq!(errors.len(), 8);
    }

    #[test]
    fn test_sign_up_account_rules() {
        let record = complete_member()
            .with("email", "not-an-email")
            .with("password", "secret")
            .with("password_confirmation", "secrets")
            .with("phone", "0991234567")
            .with("country", "Ecuador");

        let errors = Schema::sign_up()
            .validate(&record, Discriminant::Member)
            .unwrap_err();
        assert_eq!(errors.fields(), vec!["email", "password", "password_confirmation"]);
    }

    #[test]
    fn test_member_custom_brand_fallback() {
        let schema = Schema::entity_registration();
        let record = complete_member().with("drive_rubber_brand", CUSTOM_BRAND);

        let errors = schema.validate(&record, Discriminant::Member).unwrap_err();
        assert_eq!(
            errors.fields(),
            vec!["drive_rubber_custom_brand", "drive_rubber_custom_model"]
        );

        let record = record
            .with("drive_rubber_custom_brand", "Sanwei")
            .with("drive_rubber_custom_model", "Target Pro");
        assert!(schema.validate(&record, Discriminant::Member).is_ok());
    }

    #[test]
    fn test_check_discriminant() {
        let schema = Schema::sign_up();
        assert_eq!(
            schema.check_discriminant(&RegistrantRecord::new().with("role", "club-admin")),
            Ok(Discriminant::Club)
        );
        let errors = schema
            .check_discriminant(&RegistrantRecord::new().with("role", "referee"))
            .unwrap_err();
        assert_eq!(errors.fields(), vec!["role"]);
        assert!(schema.check_discriminant(&RegistrantRecord::new()).is_err());
    }

    #[test]
    fn test_validate_fields_filters_rules() {
        let schema = Schema::entity_registration();
        let record = RegistrantRecord::new().with("full_name", "Ana");
        assert!(schema
            .validate_fields(&record, Discriminant::Member, &["full_name"])
            .is_ok());
        assert!(schema
            .validate_fields(&record, Discriminant::Member, &["full_name", "gender"])
            .is_err());
    }

    #[test]
    fn test_field_set_includes_discriminant_and_derived() {
        let fields = Schema::sign_up().field_set(Discriminant::Member);
        assert_eq!(fields[0], "role");
        assert!(fields.contains(&"email"));
        assert!(fields.contains(&"federation_name"));
        assert!(fields.contains(&"racket_custom_model"));
        let mut deduped = fields.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), fields.len());
    }

    #[test]
    fn test_required_fields_exclude_conditional() {
        let required = Schema::entity_registration().required_fields(Discriminant::Member);
        assert_eq!(
            required,
            vec!["full_name", "parent_club_id", "birth_date", "gender", "rubber_type"]
        );
    }
}
