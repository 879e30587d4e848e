pub mod collections;
pub mod fields;
pub mod session;
pub mod steps;

pub use collections::{AreaField, EditOutcome, FeatureField, ImageField};
pub use fields::{set_field, FieldChange};
pub use session::{FormSession, SaveAttempt, SaveState, StepChange};
pub use steps::FormStep;
