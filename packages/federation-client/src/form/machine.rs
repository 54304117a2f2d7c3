//! Multi-step form state machine.
//!
//! One aggregate [`RegistrantRecord`] is the source of truth; steps are views
//! over subsets of it. `next` validates the fields of the step being left,
//! `back` never validates and never discards anything, and the full record
//! is validated once more when submission is prepared.

use serde_json::Value;
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::debug;

use super::reference::ReferenceData;
use super::steps::{Flow, Step};
use crate::error::ValidationErrors;
use crate::record::RegistrantRecord;
use crate::schema::{slot_for_brand, Schema, CUSTOM_BRAND, EQUIPMENT_SLOTS};
use crate::submission::ErrorReport;
use crate::types::{Discriminant, RegistrationReceipt};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransitionError {
    #[error("step is incomplete: {0}")]
    Invalid(ValidationErrors),

    #[error("already on the final step")]
    AtFinalStep,

    #[error("submission is only possible from the final step")]
    NotAtFinalStep,

    #[error("form was already submitted")]
    AlreadySubmitted,
}

impl From<ValidationErrors> for TransitionError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Invalid(errors)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormState {
    Editing { step: usize },
    Submitted,
}

#[derive(Debug, Clone)]
pub struct FormMachine {
    flow: Flow,
    schema: Schema,
    state: FormState,
    record: RegistrantRecord,
    dirty: BTreeSet<String>,
    reference: ReferenceData,
    receipt: Option<RegistrationReceipt>,
    last_error: Option<ErrorReport>,
}

impl FormMachine {
    pub fn new(flow: Flow) -> Self {
        let schema = flow.schema();
        let mut record = RegistrantRecord::new();
        if let Some(fixed) = flow.fixed_discriminant() {
            record.set(schema.discriminant_field(), fixed.as_str());
        }

        Self {
            flow,
            schema,
            state: FormState::Editing { step: 0 },
            record,
            dirty: BTreeSet::new(),
            reference: ReferenceData::new(),
            receipt: None,
            last_error: None,
        }
    }

    pub fn with_reference_data(mut self, reference: ReferenceData) -> Self {
        self.reference = reference;
        self
    }

    pub fn flow(&self) -> Flow {
        self.flow
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn record(&self) -> &RegistrantRecord {
        &self.record
    }

    /// Current step index; the last step once submitted.
    pub fn step(&self) -> usize {
        match self.state {
            FormState::Editing { step } => step,
            FormState::Submitted => self.flow.step_count() - 1,
        }
    }

    pub fn step_count(&self) -> usize {
        self.flow.step_count()
    }

    pub fn is_final_step(&self) -> bool {
        self.step() + 1 == self.step_count()
    }

    pub fn is_submitted(&self) -> bool {
        self.state == FormState::Submitted
    }

    pub fn discriminant(&self) -> Option<Discriminant> {
        self.flow
            .fixed_discriminant()
            .or_else(|| self.record.discriminant(self.schema.discriminant_field()))
    }

    pub fn steps(&self) -> Vec<Step> {
        self.flow.steps(self.discriminant())
    }

    pub fn current_step(&self) -> Step {
        let mut steps = self.steps();
        steps.swap_remove(self.step())
    }

    /// Fields of the current step that should be shown. Custom brand/model
    /// inputs only appear while their slot's brand is the custom sentinel.
    pub fn visible_fields(&self) -> Vec<&'static str> {
        let hidden: Vec<&'static str> = EQUIPMENT_SLOTS
            .iter()
            .filter(|slot| !self.is_custom(slot.brand_field))
            .flat_map(|slot| [slot.custom_brand_field, slot.custom_model_field])
            .collect();
        self.current_step()
            .fields
            .into_iter()
            .filter(|f| !hidden.contains(f))
            .collect()
    }

    pub fn is_dirty(&self, field: &str) -> bool {
        self.dirty.contains(field)
    }

    pub fn dirty_fields(&self) -> impl Iterator<Item = &str> {
        self.dirty.iter().map(String::as_str)
    }

    pub fn receipt(&self) -> Option<&RegistrationReceipt> {
        self.receipt.as_ref()
    }

    pub fn last_error(&self) -> Option<&ErrorReport> {
        self.last_error.as_ref()
    }

    /// Record user input for `field` and apply its side effects.
    pub fn set_field(
        &mut self,
        field: &str,
        value: impl Into<Value>,
    ) -> Result<(), TransitionError> {
        if self.is_submitted() {
            return Err(TransitionError::AlreadySubmitted);
        }
        if field == self.schema.discriminant_field() && self.flow.fixed_discriminant().is_some() {
            debug!(field, "Ignoring change to a fixed discriminant");
            return Ok(());
        }

        let value = value.into();
        let text = match &value {
            Value::String(s) => s.trim().to_string(),
            other => other.to_string(),
        };
        self.record.set(field, value);
        self.dirty.insert(field.to_string());

        self.apply_derived(field, &text);
        self.apply_custom_brand(field, &text);
        Ok(())
    }

    fn apply_derived(&mut self, field: &str, value: &str) {
        let Some(discriminant) = self.discriminant() else {
            return;
        };
        for derived in self.schema.derived_fields(discriminant) {
            if derived.source != field {
                continue;
            }
            match self.reference.lookup(field, value) {
                Some(found) => {
                    debug!(source = field, target = derived.target, "Derived field updated");
                    let found = found.to_string();
                    self.record.set(derived.target, found);
                }
                None => {
                    self.record.remove(derived.target);
                }
            }
        }
    }

    fn apply_custom_brand(&mut self, field: &str, value: &str) {
        let Some(slot) = slot_for_brand(field) else {
            return;
        };
        if value == CUSTOM_BRAND {
            self.record.set(slot.model_field, "");
            for revealed in [slot.custom_brand_field, slot.custom_model_field] {
                if !self.record.contains(revealed) {
                    self.record.set(revealed, "");
                }
            }
        } else {
            for cleared in [slot.custom_brand_field, slot.custom_model_field] {
                if self.record.contains(cleared) {
                    self.record.set(cleared, "");
                }
            }
        }
    }

    fn is_custom(&self, brand_field: &str) -> bool {
        self.record
            .get_str(brand_field)
            .is_some_and(|v| v.trim() == CUSTOM_BRAND)
    }

    /// Validate the current step and advance.
    pub fn next(&mut self) -> Result<usize, TransitionError> {
        let step = match self.state {
            FormState::Submitted => return Err(TransitionError::AlreadySubmitted),
            FormState::Editing { step } => step,
        };
        if self.is_final_step() {
            return Err(TransitionError::AtFinalStep);
        }

        self.validate_step(&self.current_step())?;
        self.state = FormState::Editing { step: step + 1 };
        debug!(flow = ?self.flow, step = step + 1, "Advanced form step");
        Ok(step + 1)
    }

    /// Go back one step. Never validates; on the first step this is a no-op.
    pub fn back(&mut self) -> usize {
        if let FormState::Editing { step } = self.state {
            self.state = FormState::Editing {
                step: step.saturating_sub(1),
            };
        }
        self.step()
    }

    fn validate_step(&self, step: &Step) -> Result<(), ValidationErrors> {
        let discriminant_field = self.schema.discriminant_field();
        let discriminant = if step.owns(discriminant_field) {
            self.schema.check_discriminant(&self.record)?
        } else {
            match self.discriminant() {
                Some(d) => d,
                None => return self.schema.check_discriminant(&self.record).map(|_| ()),
            }
        };
        self.schema
            .validate_fields(&self.record, discriminant, &step.fields)
    }

    /// Validate the whole record and return the payload to submit: only
    /// the fields the chosen discriminant's form contains.
    pub fn prepare_submission(&self) -> Result<RegistrantRecord, TransitionError> {
        if self.is_submitted() {
            return Err(TransitionError::AlreadySubmitted);
        }
        if !self.is_final_step() {
            return Err(TransitionError::NotAtFinalStep);
        }

        let discriminant = self.schema.validate_record(&self.record)?;
        let fields = self.schema.field_set(discriminant);
        Ok(self
            .record
            .iter()
            .filter(|(k, _)| fields.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    pub fn complete(&mut self, receipt: RegistrationReceipt) {
        self.state = FormState::Submitted;
        self.receipt = Some(receipt);
        self.last_error = None;
    }

    pub fn fail(&mut self, report: ErrorReport) {
        self.last_error = Some(report);
    }
}
