//! Property tests for schema validation and option merging.

use proptest::prelude::*;

use federation_client::{
    catalog::merge_options, schema::is_valid_email, Discriminant, RegistrantRecord, Schema,
};

const CLUB_FIELDS: [(&str, &str); 4] = [
    ("club_name", "Club Deportivo Quito"),
    ("parent_league_id", "3"),
    ("city", "Quito"),
    ("address", "Av. Amazonas N34"),
];

/// A value that passes every check on `field`.
fn valid_value(field: &str, filler: &str) -> String {
    match field {
        "email" => "ana@clubquito.ec".to_string(),
        "password" | "password_confirmation" => "s3cretpass".to_string(),
        "birth_date" => "2004-03-18".to_string(),
        "gender" => "female".to_string(),
        "rubber_type" => "smooth".to_string(),
        _ => filler.to_string(),
    }
}

proptest! {
    /// A record holding exactly the required fields validates, and blanking
    /// any one of them fails on that field.
    #[test]
    fn every_required_field_is_needed(
        discriminant in proptest::sample::select(Discriminant::ALL.to_vec()),
        sign_up in any::<bool>(),
        which in any::<proptest::sample::Index>(),
        filler in "[A-Za-z][A-Za-z ]{0,12}",
    ) {
        let schema = if sign_up { Schema::sign_up() } else { Schema::entity_registration() };
        let required = schema.required_fields(discriminant);
        prop_assert!(!required.is_empty());

        let mut record = RegistrantRecord::new().with("role", discriminant.role_str());
        for field in &required {
            record.set(*field, valid_value(field, &filler));
        }
        prop_assert!(schema.validate(&record, discriminant).is_ok());
        prop_assert_eq!(schema.validate_record(&record).ok(), Some(discriminant));

        let blanked = *which.get(&required);
        record.set(blanked, "");
        let result = schema.validate(&record, discriminant);
        prop_assert!(result.is_err());
        let errors = result.unwrap_err();

        // The confirmation is the only check that reads another field
        let expected = if blanked == "password" {
            vec!["password", "password_confirmation"]
        } else {
            vec![blanked]
        };
        prop_assert_eq!(errors.fields(), expected);
    }

    /// Every blank required field is reported, and only those.
    #[test]
    fn club_errors_match_blank_fields(present in proptest::collection::vec(any::<bool>(), 4)) {
        let schema = Schema::entity_registration();
        let mut record = RegistrantRecord::new().with("role", "club");
        let mut expected = Vec::new();
        for ((field, value), keep) in CLUB_FIELDS.iter().zip(&present) {
            if *keep {
                record.set(*field, *value);
            } else {
                record.set(*field, "   ");
                expected.push(*field);
            }
        }

        match schema.validate(&record, Discriminant::Club) {
            Ok(()) => prop_assert!(expected.is_empty()),
            Err(errors) => {
                prop_assert_eq!(errors.fields(), expected);
                prop_assert_eq!(errors.len(), errors.fields().len());
            }
        }
    }

    /// Validation is a pure function of the record.
    #[test]
    fn validation_is_deterministic(name in "[ a-zA-Z]{0,12}", date in "[0-9-]{0,10}") {
        let schema = Schema::entity_registration();
        let record = RegistrantRecord::new()
            .with("role", "member")
            .with("full_name", name)
            .with("birth_date", date);
        prop_assert_eq!(
            schema.validate(&record, Discriminant::Member),
            schema.validate(&record, Discriminant::Member)
        );
    }

    #[test]
    fn email_without_at_sign_is_rejected(value in "[^@]{0,40}") {
        prop_assert!(!is_valid_email(&value));
    }

    #[test]
    fn simple_addresses_are_accepted(local in "[a-z0-9]{1,12}", domain in "[a-z]{1,12}", tld in "[a-z]{2,6}") {
        let email = format!("{local}@{domain}.{tld}");
        prop_assert!(is_valid_email(&email));
    }

    /// Predefined entries keep their order at the front; nothing repeats.
    #[test]
    fn merge_keeps_predefined_prefix(remote in proptest::collection::vec("[A-Za-z ]{0,8}", 0..20)) {
        let predefined = ["Butterfly", "DHS", "Stiga"];
        let merged = merge_options(&predefined, &remote);

        let expected: Vec<String> = predefined.iter().map(|s| s.to_string()).collect();
        prop_assert_eq!(&merged[..3], &expected[..]);
        for (i, value) in merged.iter().enumerate() {
            prop_assert!(!value.trim().is_empty());
            prop_assert!(!merged[i + 1..].contains(value));
        }
        for value in &remote {
            let value = value.trim();
            prop_assert!(value.is_empty() || merged.iter().any(|m| m == value));
        }
    }
}
