//! Step layouts for the multi-step flows.

use crate::schema::{Schema, EQUIPMENT_SLOTS};
use crate::types::Discriminant;

/// A titled view over a subset of the record's fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub title: &'static str,
    pub fields: Vec<&'static str>,
}

impl Step {
    fn new(title: &'static str, fields: Vec<&'static str>) -> Self {
        Self { title, fields }
    }

    pub fn owns(&self, field: &str) -> bool {
        self.fields.contains(&field)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Account sign-up: pick a role, then fill in everything that role needs.
    SignUp,
    /// Member census: personal data, club and equipment, then photo.
    MemberCensus,
}

impl Flow {
    pub fn schema(&self) -> Schema {
        match self {
            Self::SignUp => Schema::sign_up(),
            Self::MemberCensus => Schema::entity_registration(),
        }
    }

    /// Discriminant the flow is locked to, if the user does not choose one.
    pub fn fixed_discriminant(&self) -> Option<Discriminant> {
        match self {
            Self::SignUp => None,
            Self::MemberCensus => Some(Discriminant::Member),
        }
    }

    pub fn step_count(&self) -> usize {
        match self {
            Self::SignUp => 2,
            Self::MemberCensus => 3,
        }
    }

    /// The steps for `discriminant`. The union of their fields is exactly
    /// the schema's field set; before a discriminant is chosen the later
    /// sign-up step is empty.
    pub fn steps(&self, discriminant: Option<Discriminant>) -> Vec<Step> {
        let schema = self.schema();
        let discriminant = self.fixed_discriminant().or(discriminant);
        let all = discriminant.map(|d| schema.field_set(d)).unwrap_or_default();

        match self {
            Self::SignUp => {
                let role = schema.discriminant_field();
                vec![
                    Step::new("Choose your role", vec![role]),
                    Step::new("Your details", without(&all, &[role])),
                ]
            }
            Self::MemberCensus => {
                let personal = vec![schema.discriminant_field(), "full_name", "birth_date", "gender"];

                let mut club = vec!["parent_club_id", "federation_name", "rubber_type"];
                for slot in EQUIPMENT_SLOTS.iter() {
                    club.extend([
                        slot.brand_field,
                        slot.model_field,
                        slot.custom_brand_field,
                        slot.custom_model_field,
                    ]);
                }
                club.extend(["drive_rubber_hardness", "backhand_rubber_hardness"]);
                let club: Vec<&'static str> = club.into_iter().filter(|f| all.contains(f)).collect();

                let assigned: Vec<&'static str> =
                    personal.iter().chain(club.iter()).copied().collect();
                let rest = without(&all, &assigned);

                vec![
                    Step::new("Personal data", personal),
                    Step::new("Club & equipment", club),
                    Step::new("Photo & review", rest),
                ]
            }
        }
    }
}

fn without(fields: &[&'static str], excluded: &[&'static str]) -> Vec<&'static str> {
    fields
        .iter()
        .copied()
        .filter(|f| !excluded.contains(f))
        .collect()
}
