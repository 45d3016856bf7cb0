use crate::domain::{
    DrawEvent, FieldId, FieldValue, GeneralField, LocationField, LookupOption, RegionLevel,
    StepId, TechnicalField,
};

use super::{convert::parse_input, error::FieldCoercionError};

#[derive(Debug, Clone, PartialEq)]
pub struct FieldEdit<F> {
    pub field: F,
    pub value: Option<FieldValue>,
}

impl<F> FieldEdit<F> {
    pub fn set(field: F, value: impl Into<FieldValue>) -> Self {
        Self {
            field,
            value: Some(value.into()),
        }
    }

    pub fn clear(field: F) -> Self {
        Self { field, value: None }
    }
}

/// What a step view may ask of the wizard. Views never touch state directly.
#[derive(Debug, Clone, PartialEq)]
pub enum StepIntent {
    General(FieldEdit<GeneralField>),
    Technical(FieldEdit<TechnicalField>),
    Location(FieldEdit<LocationField>),
    SelectRegion {
        level: RegionLevel,
        option: Option<LookupOption>,
    },
    Draw(DrawEvent),
}

impl StepIntent {
    pub fn step(&self) -> StepId {
        match self {
            StepIntent::General(_) | StepIntent::SelectRegion { .. } => StepId::General,
            StepIntent::Technical(_) => StepId::Technical,
            StepIntent::Location(_) | StepIntent::Draw(_) => StepId::Location,
        }
    }

    /// Parses `step.field=value`. An empty value clears the field. Region id
    /// fields are routed through the selector chain so descendants reset.
    pub fn parse_assignment(raw: &str) -> Result<Self, FieldCoercionError> {
        let (target, value) = raw
            .split_once('=')
            .ok_or_else(|| FieldCoercionError::new(raw, "expected step.field=value"))?;
        let (step, name) = target
            .trim()
            .split_once('.')
            .ok_or_else(|| FieldCoercionError::new(target, "expected step.field"))?;
        let step = StepId::from_name(step)
            .ok_or_else(|| FieldCoercionError::new(target, format!("unknown step '{step}'")))?;
        match step {
            StepId::General => {
                let field = lookup_field::<GeneralField>(name)?;
                if let Some(level) = RegionLevel::ALL
                    .into_iter()
                    .find(|level| level.id_field() == field)
                {
                    let option = parse_input(field, value)?
                        .and_then(|value| value.as_str().map(str::to_string))
                        .map(|id| LookupOption::new(id.clone(), id));
                    return Ok(StepIntent::SelectRegion { level, option });
                }
                Ok(StepIntent::General(FieldEdit {
                    field,
                    value: parse_input(field, value)?,
                }))
            }
            StepId::Technical => {
                let field = lookup_field::<TechnicalField>(name)?;
                Ok(StepIntent::Technical(FieldEdit {
                    field,
                    value: parse_input(field, value)?,
                }))
            }
            StepId::Location => {
                let field = lookup_field::<LocationField>(name)?;
                Ok(StepIntent::Location(FieldEdit {
                    field,
                    value: parse_input(field, value)?,
                }))
            }
        }
    }
}

fn lookup_field<F: FieldId>(name: &str) -> Result<F, FieldCoercionError> {
    F::from_name(name.trim()).ok_or_else(|| FieldCoercionError::new(name, "unknown field"))
}
