use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{Household, HouseholdPayload, SubmissionStatus};

use super::DocumentFormat;

/// A household read from disk. Unlike [`Household`], the id is optional so
/// that a not-yet-created draft can be loaded too.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HouseholdDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub status: SubmissionStatus,
    #[serde(flatten)]
    pub payload: HouseholdPayload,
}

impl HouseholdDocument {
    pub fn into_household(self, fallback_id: impl Into<String>) -> Household {
        Household {
            id: self.id.unwrap_or_else(|| fallback_id.into()),
            status: self.status,
            rejection_reason: None,
            payload: self.payload,
        }
    }
}

impl From<Household> for HouseholdDocument {
    fn from(household: Household) -> Self {
        Self {
            id: Some(household.id),
            status: household.status,
            payload: household.payload,
        }
    }
}

/// Parse structured data in any supported format into a `serde_json::Value`.
pub fn parse_document_str(contents: &str, format: DocumentFormat) -> Result<Value> {
    match format {
        DocumentFormat::Json => {
            serde_json::from_str::<Value>(contents).with_context(|| "failed to parse JSON document")
        }
        #[cfg(feature = "yaml")]
        DocumentFormat::Yaml => {
            serde_yaml::from_str::<Value>(contents).with_context(|| "failed to parse YAML document")
        }
        #[cfg(feature = "toml")]
        DocumentFormat::Toml => contents
            .parse::<toml::Value>()
            .with_context(|| "failed to parse TOML document")
            .and_then(|value| {
                serde_json::to_value(value).context("failed to convert TOML to JSON")
            }),
    }
}

/// Tries `preferred` first, then every other compiled-in format.
pub fn parse_document_any(contents: &str, preferred: DocumentFormat) -> Result<Value> {
    let primary = match parse_document_str(contents, preferred) {
        Ok(value) => return Ok(value),
        Err(err) => err,
    };
    for candidate in DocumentFormat::available_formats() {
        if candidate == preferred {
            continue;
        }
        if let Ok(value) = parse_document_str(contents, candidate) {
            return Ok(value);
        }
    }
    let tried: Vec<String> = DocumentFormat::available_formats()
        .into_iter()
        .map(|format| format.to_string())
        .collect();
    Err(anyhow!(
        "tried {} (first error: {primary:#})",
        tried.join(", ")
    ))
}

/// Reads a household from a parsed document. Accepts the bare record or the
/// server's `{ "data": { ... } }` envelope.
pub fn household_from_value(value: Value) -> Result<HouseholdDocument> {
    let value = match value {
        Value::Object(mut map) if map.get("data").is_some_and(Value::is_object) => {
            map.remove("data").unwrap_or_default()
        }
        other => other,
    };
    if !value.is_object() {
        return Err(anyhow!("household document must be an object"));
    }
    serde_json::from_value(value).context("household document does not match the survey layout")
}

pub fn parse_household_str(contents: &str, format: DocumentFormat) -> Result<HouseholdDocument> {
    household_from_value(parse_document_any(contents, format)?)
}
