mod gate;
mod options;
mod status;
mod validation;
mod wizard;

pub use gate::{SaveGate, SavePermit};
pub use options::WizardOptions;
pub use status::{
    GENERIC_ERROR_MESSAGE, Notice, NoticeKind, SAVED_MESSAGE, SESSION_EXPIRED_MESSAGE,
};
pub use validation::{GeneralInfoValidator, REQUIRED_GENERAL_FIELDS, ValidationIssue};
pub use wizard::{StepTransition, Wizard, WizardError};
