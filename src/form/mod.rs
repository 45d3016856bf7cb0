mod actions;
mod cascade;
mod computed;
mod convert;
mod engine;
mod error;
mod state;

pub use actions::{FieldEdit, StepIntent};
pub use cascade::{
    LevelState, LookupApplied, LookupFailure, LookupResponse, LookupStatus, LookupTicket,
    RegionChain, Selection,
};
pub use computed::{recompute, recompute_all};
pub use convert::{parse_input, value_from_json};
pub use engine::{FormEngine, RecordChange};
pub use error::FieldCoercionError;
pub use state::{Dispatched, StepChange, WizardState};
