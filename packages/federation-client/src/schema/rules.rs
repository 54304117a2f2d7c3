//! Field rules and their evaluation.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ValidationErrors;
use crate::record::RegistrantRecord;

lazy_static! {
    // WHATWG "valid e-mail address" grammar, with at least one dot in the domain.
    static ref EMAIL: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+$"
    )
    .expect("email pattern is valid");
}

/// One check applied to a field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    /// Present and non-empty after trimming.
    Required,
    /// Matches the e-mail grammar. Not trimmed.
    Email,
    /// At least this many characters. Not trimmed.
    MinLength(usize),
    /// Equal to another field's value.
    SameAs(&'static str),
    /// Member of a closed set.
    OneOf(&'static [&'static str]),
    /// Calendar date in `YYYY-MM-DD` form.
    Date,
}

/// Applies `rule` only when `field` currently holds `equals`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Condition {
    pub field: &'static str,
    pub equals: &'static str,
}

impl Condition {
    pub fn holds(&self, record: &RegistrantRecord) -> bool {
        record
            .get_str(self.field)
            .is_some_and(|v| v.trim() == self.equals)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule {
    pub field: &'static str,
    pub label: &'static str,
    pub checks: &'static [Check],
    pub when: Option<Condition>,
}

impl FieldRule {
    pub const fn new(field: &'static str, label: &'static str, checks: &'static [Check]) -> Self {
        Self {
            field,
            label,
            checks,
            when: None,
        }
    }

    pub const fn when(mut self, field: &'static str, equals: &'static str) -> Self {
        self.when = Some(Condition { field, equals });
        self
    }

    pub fn is_required(&self) -> bool {
        self.checks.contains(&Check::Required)
    }

    pub fn applies_to(&self, record: &RegistrantRecord) -> bool {
        self.when.map_or(true, |c| c.holds(record))
    }

    /// Evaluate every check, appending one error per failing check.
    ///
    /// A blank required field yields a single "required" error; the format
    /// checks need a value to say anything. Blank optional fields pass.
    pub fn evaluate(&self, record: &RegistrantRecord, errors: &mut ValidationErrors) {
        if !self.applies_to(record) {
            return;
        }

        if record.is_blank(self.field) {
            if self.is_required() {
                errors.push(self.field, format!("The {} field is required.", self.label));
            }
            return;
        }

        let value = record.get_str(self.field).unwrap_or_default();
        for check in self.checks {
            if let Some(message) = self.failure(check, &value, record) {
                errors.push(self.field, message);
            }
        }
    }

    fn failure(&self, check: &Check, value: &str, record: &RegistrantRecord) -> Option<String> {
        match check {
            Check::Required => None,
            Check::Email => (!EMAIL.is_match(value))
                .then(|| format!("The {} must be a valid email address.", self.label)),
            Check::MinLength(min) => (value.chars().count() < *min)
                .then(|| format!("The {} must be at least {min} characters.", self.label)),
            Check::SameAs(other) => {
                let other_value = record.get_str(other).unwrap_or_default();
                (value != other_value).then(|| format!("The {} does not match.", self.label))
            }
            Check::OneOf(allowed) => (!allowed.contains(&value))
                .then(|| format!("The selected {} is invalid.", self.label)),
            Check::Date => NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .is_err()
                .then(|| format!("The {} must be a date (YYYY-MM-DD).", self.label)),
        }
    }
}

pub fn is_valid_email(value: &str) -> bool {
    EMAIL.is_match(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAME: FieldRule = FieldRule::new("full_name", "full name", &[Check::Required]);
    const GENDER: FieldRule = FieldRule::new(
        "gender",
        "gender",
        &[Check::Required, Check::OneOf(&["male", "female"])],
    );

    #[test]
    fn test_email_grammar() {
        assert!(is_valid_email("ana.torres@fedetenis.ec"));
        assert!(is_valid_email("a+b@club.org"));
        assert!(!is_valid_email("ana@localhost"));
        assert!(!is_valid_email("ana.torres"));
        assert!(!is_valid_email(" ana@club.org"));
    }

    #[test]
    fn test_required_trims() {
        let mut errors = ValidationErrors::new();
        NAME.evaluate(&RegistrantRecord::new().with("full_name", "   "), &mut errors);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_enum_rejects_empty_and_unknown() {
        let mut errors = ValidationErrors::new();
        GENDER.evaluate(&RegistrantRecord::new().with("gender", ""), &mut errors);
        GENDER.evaluate(&RegistrantRecord::new().with("gender", "robot"), &mut errors);
        GENDER.evaluate(&RegistrantRecord::new().with("gender", "female"), &mut errors);
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_min_length_does_not_trim() {
        const PASSWORD: FieldRule =
            FieldRule::new("password", "password", &[Check::Required, Check::MinLength(8)]);
        let mut errors = ValidationErrors::new();
        PASSWORD.evaluate(&RegistrantRecord::new().with("password", "  abc   "), &mut errors);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_condition_gates_rule() {
        const CUSTOM: FieldRule = FieldRule::new("racket_custom_brand", "custom brand", &[Check::Required])
            .when("racket_brand", "custom");

        let mut errors = ValidationErrors::new();
        CUSTOM.evaluate(&RegistrantRecord::new().with("racket_brand", "Butterfly"), &mut errors);
        assert!(errors.is_empty());

        CUSTOM.evaluate(&RegistrantRecord::new().with("racket_brand", "custom"), &mut errors);
        assert_eq!(errors.fields(), vec!["racket_custom_brand"]);
    }

    #[test]
    fn test_date_check() {
        const BIRTH: FieldRule = FieldRule::new("birth_date", "birth date", &[Check::Required, Check::Date]);
        let mut errors = ValidationErrors::new();
        BIRTH.evaluate(&RegistrantRecord::new().with("birth_date", "2009-02-30"), &mut errors);
        BIRTH.evaluate(&RegistrantRecord::new().with("birth_date", "2009-02-28"), &mut errors);
        assert_eq!(errors.len(), 1);
    }
}
