#![deny(rust_2018_idioms)]

pub mod app;
pub mod domain;
pub mod form;
pub mod io;
pub mod presentation;

pub use app::{
    GeneralInfoValidator, Notice, NoticeKind, SaveGate, StepTransition, ValidationIssue, Wizard,
    WizardError, WizardOptions,
};
pub use domain::{
    GeneralField, GeneralInfo, Household, HouseholdPayload, LocationField, LookupOption,
    MapLocation, RegionLevel, StepId, TechnicalData, TechnicalField,
};
pub use form::{FieldEdit, FormEngine, RecordChange, RegionChain, StepIntent, WizardState};
pub use io::{
    ApiClient, ApiError, ClientConfig, DocumentFormat, HouseholdStore, LookupDispatcher,
    OutputDestination, OutputOptions, RegionSource, parse_household_str,
};

pub mod prelude {
    pub use super::{
        ApiClient, ClientConfig, FieldEdit, HouseholdStore, StepIntent, StepTransition, Wizard,
        WizardOptions,
    };
}
