use std::fmt;

use anyhow::{Context, Result};
use jsonschema::{Validator, validator_for};
use regex::Regex;
use schemars::schema_for;

use crate::domain::{FieldId, GeneralField, GeneralInfo};

/// Checked in this order; the first gap blocks the step.
pub const REQUIRED_GENERAL_FIELDS: [GeneralField; 7] = [
    GeneralField::HeadName,
    GeneralField::Nik,
    GeneralField::Address,
    GeneralField::ProvinceId,
    GeneralField::RegencyId,
    GeneralField::DistrictId,
    GeneralField::VillageId,
];

const IDENTITY_NUMBER_FIELDS: [GeneralField; 2] =
    [GeneralField::Nik, GeneralField::FamilyCardNumber];

/// One problem that keeps the general step from being saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Wire name of the offending field, empty for record-level problems.
    pub field: String,
    pub message: String,
}

impl ValidationIssue {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Client-side gate for the general-information step: required fields,
/// 16-digit identity numbers, then the structural constraints derived from
/// the record's JSON Schema.
pub struct GeneralInfoValidator {
    schema: Validator,
    sixteen_digits: Regex,
}

impl fmt::Debug for GeneralInfoValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneralInfoValidator").finish_non_exhaustive()
    }
}

impl GeneralInfoValidator {
    pub fn new() -> Result<Self> {
        let schema = serde_json::to_value(schema_for!(GeneralInfo))
            .context("failed to render general-info schema")?;
        let schema = validator_for(&schema).context("failed to compile general-info schema")?;
        let sixteen_digits = Regex::new(r"^\d{16}$").context("invalid identity pattern")?;
        Ok(Self {
            schema,
            sixteen_digits,
        })
    }

    /// Every issue, in reporting order.
    pub fn validate(&self, record: &GeneralInfo) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        for field in REQUIRED_GENERAL_FIELDS {
            if is_blank(record, field) {
                issues.push(ValidationIssue::new(
                    field.name(),
                    format!("{} is required", field.label()),
                ));
            }
        }

        for field in IDENTITY_NUMBER_FIELDS {
            if let Some(value) = text_of(record, field)
                && !value.trim().is_empty()
                && !self.sixteen_digits.is_match(value.trim())
            {
                issues.push(ValidationIssue::new(
                    field.name(),
                    format!("{} must be exactly 16 digits", field.label()),
                ));
            }
        }

        match serde_json::to_value(record) {
            Ok(value) => {
                for error in self.schema.iter_errors(&value) {
                    let pointer = error.instance_path.to_string();
                    let name = pointer.trim_start_matches('/');
                    let message = match GeneralField::from_name(name) {
                        Some(field) => format!("{}: {error}", field.label()),
                        None => error.to_string(),
                    };
                    issues.push(ValidationIssue::new(name, message));
                }
            }
            Err(err) => issues.push(ValidationIssue::new("", err.to_string())),
        }

        issues
    }

    pub fn first_issue(&self, record: &GeneralInfo) -> Option<ValidationIssue> {
        self.validate(record).into_iter().next()
    }
}

fn text_of(record: &GeneralInfo, field: GeneralField) -> Option<&str> {
    match field {
        GeneralField::HeadName => record.head_name.as_deref(),
        GeneralField::Nik => record.nik.as_deref(),
        GeneralField::FamilyCardNumber => record.family_card_number.as_deref(),
        GeneralField::Address => record.address.as_deref(),
        GeneralField::ProvinceId => record.province_id.as_deref(),
        GeneralField::RegencyId => record.regency_id.as_deref(),
        GeneralField::DistrictId => record.district_id.as_deref(),
        GeneralField::VillageId => record.village_id.as_deref(),
        _ => None,
    }
}

fn is_blank(record: &GeneralInfo, field: GeneralField) -> bool {
    text_of(record, field).is_none_or(|value| value.trim().is_empty())
}
