//! Multi-step registration forms.

pub mod machine;
pub mod reference;
pub mod steps;

pub use machine::{FormMachine, FormState, TransitionError};
pub use reference::{ClubReference, ReferenceData};
pub use steps::{Flow, Step};
