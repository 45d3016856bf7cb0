mod audit;
pub mod derive;
mod geometry;
mod household;
mod infrastructure;
mod record;
mod region;
mod value;

pub use audit::{AuditEntry, AuditEvent, FieldDiff};
pub use geometry::{
    DrawEvent, Geometry, GeometryError, GeometryType, LatLng, MapLayers, MapShape, Position,
};
pub use household::{
    GeneralField, GeneralInfo, Household, HouseholdPayload, LocationField, MapLocation, StepId,
    SubmissionStatus, TechnicalData, TechnicalField,
};
pub use infrastructure::{AssetCondition, InfrastructureCategory, InfrastructureItem};
pub use record::{ComputedField, FieldId, FormRecord};
pub use region::{LookupOption, RegionLevel};
pub use value::{FieldKind, FieldSlot, FieldValue, normalize};
