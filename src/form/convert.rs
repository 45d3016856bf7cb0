use chrono::NaiveDate;
use serde_json::Value;

use crate::domain::{FieldId, FieldKind, FieldValue};

use super::error::FieldCoercionError;

/// Parses raw text input for `field`. Blank input clears the field.
pub fn parse_input<F: FieldId>(
    field: F,
    contents: &str,
) -> Result<Option<FieldValue>, FieldCoercionError> {
    let trimmed = contents.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let fail = |message: String| FieldCoercionError::new(field.name(), message);
    let value = match field.kind() {
        FieldKind::Text => FieldValue::Text(trimmed.to_string()),
        FieldKind::Count => trimmed
            .parse::<u32>()
            .map(|n| FieldValue::Integer(i64::from(n)))
            .map_err(|_| fail(format!("'{trimmed}' is not a valid non-negative whole number")))?,
        FieldKind::Decimal => {
            let normalized = trimmed.replace(',', ".");
            normalized
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map(FieldValue::Number)
                .ok_or_else(|| fail(format!("'{trimmed}' is not a valid number")))?
        }
        FieldKind::Flag => match trimmed.to_ascii_lowercase().as_str() {
            "true" | "yes" | "ya" | "1" => FieldValue::Bool(true),
            "false" | "no" | "tidak" | "0" => FieldValue::Bool(false),
            _ => return Err(fail(format!("'{trimmed}' is not a valid boolean"))),
        },
        FieldKind::Date => NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .map(FieldValue::Date)
            .map_err(|_| fail(format!("'{trimmed}' is not a date (expected YYYY-MM-DD)")))?,
    };
    Ok(Some(value))
}

/// Converts a JSON value (e.g. from a seed document) into a field value.
pub fn value_from_json<F: FieldId>(
    field: F,
    value: &Value,
) -> Result<Option<FieldValue>, FieldCoercionError> {
    match value {
        Value::Null => Ok(None),
        Value::String(text) => parse_input(field, text),
        Value::Bool(flag) => parse_input(field, &flag.to_string()),
        Value::Number(number) => parse_input(field, &number.to_string()),
        other => Err(FieldCoercionError::new(
            field.name(),
            format!("unsupported value {other}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{GeneralField, TechnicalField};
    use serde_json::json;

    #[test]
    fn parses_counts_and_rejects_negatives() {
        assert_eq!(
            parse_input(GeneralField::MaleMembers, " 3 ").unwrap(),
            Some(FieldValue::Integer(3))
        );
        let err = parse_input(GeneralField::MaleMembers, "-1").unwrap_err();
        assert_eq!(err.field, "maleMembers");
    }

    #[test]
    fn decimals_accept_comma_separator() {
        assert_eq!(
            parse_input(TechnicalField::BuildingLength, "7,5").unwrap(),
            Some(FieldValue::Number(7.5))
        );
    }

    #[test]
    fn blank_input_clears() {
        assert_eq!(parse_input(GeneralField::HeadName, "   ").unwrap(), None);
    }

    #[test]
    fn dates_and_flags_parse_from_text() {
        assert_eq!(
            parse_input(GeneralField::SurveyDate, "2024-03-01").unwrap(),
            Some(FieldValue::Date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()))
        );
        assert!(parse_input(GeneralField::SurveyDate, "01/03/2024").is_err());
        assert_eq!(
            parse_input(GeneralField::OwnsLand, "ya").unwrap(),
            Some(FieldValue::Bool(true))
        );
    }

    #[test]
    fn json_values_route_through_text_parsing() {
        assert_eq!(
            value_from_json(GeneralField::ProvinceId, &json!(31)).unwrap(),
            Some(FieldValue::Text("31".into()))
        );
        assert_eq!(
            value_from_json(TechnicalField::FloorCount, &json!(2)).unwrap(),
            Some(FieldValue::Integer(2))
        );
        assert!(value_from_json(GeneralField::HeadName, &json!([1])).is_err());
    }
}
