use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

/// A single form value as it crosses the engine boundary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Number(f64),
    Bool(bool),
    Date(NaiveDate),
}

/// Storage class of a record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    /// Non-negative whole number (member counts, floors).
    Count,
    Decimal,
    Flag,
    Date,
}

impl FieldKind {
    pub fn accepts(self, value: &FieldValue) -> bool {
        match (self, value) {
            (FieldKind::Text, FieldValue::Text(_)) => true,
            (FieldKind::Count, FieldValue::Integer(n)) => u32::try_from(*n).is_ok(),
            (FieldKind::Decimal, FieldValue::Number(n)) => n.is_finite(),
            (FieldKind::Decimal, FieldValue::Integer(_)) => true,
            (FieldKind::Flag, FieldValue::Bool(_)) => true,
            (FieldKind::Date, FieldValue::Date(_)) => true,
            _ => false,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FieldKind::Text => "text",
            FieldKind::Count => "count",
            FieldKind::Decimal => "decimal",
            FieldKind::Flag => "flag",
            FieldKind::Date => "date",
        };
        f.write_str(label)
    }
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Integer(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn display(&self) -> String {
        match self {
            FieldValue::Text(text) => text.clone(),
            FieldValue::Integer(n) => n.to_string(),
            FieldValue::Number(n) => format!("{n:.2}"),
            FieldValue::Bool(flag) => if *flag { "yes" } else { "no" }.to_string(),
            FieldValue::Date(date) => date.format("%Y-%m-%d").to_string(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        FieldValue::Integer(i64::from(value))
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(value: NaiveDate) -> Self {
        FieldValue::Date(value)
    }
}

/// Typed storage behind a record field.
pub trait FieldSlot: Sized {
    const KIND: FieldKind;

    fn to_field_value(&self) -> FieldValue;

    fn from_field_value(value: &FieldValue) -> Option<Self>;
}

impl FieldSlot for String {
    const KIND: FieldKind = FieldKind::Text;

    fn to_field_value(&self) -> FieldValue {
        FieldValue::Text(self.clone())
    }

    fn from_field_value(value: &FieldValue) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

impl FieldSlot for u32 {
    const KIND: FieldKind = FieldKind::Count;

    fn to_field_value(&self) -> FieldValue {
        FieldValue::Integer(i64::from(*self))
    }

    fn from_field_value(value: &FieldValue) -> Option<Self> {
        value.as_i64().and_then(|n| u32::try_from(n).ok())
    }
}

impl FieldSlot for f64 {
    const KIND: FieldKind = FieldKind::Decimal;

    fn to_field_value(&self) -> FieldValue {
        FieldValue::Number(*self)
    }

    fn from_field_value(value: &FieldValue) -> Option<Self> {
        value.as_f64().filter(|n| n.is_finite())
    }
}

impl FieldSlot for bool {
    const KIND: FieldKind = FieldKind::Flag;

    fn to_field_value(&self) -> FieldValue {
        FieldValue::Bool(*self)
    }

    fn from_field_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Bool(flag) => Some(*flag),
            _ => None,
        }
    }
}

impl FieldSlot for NaiveDate {
    const KIND: FieldKind = FieldKind::Date;

    fn to_field_value(&self) -> FieldValue {
        FieldValue::Date(*self)
    }

    fn from_field_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Date(date) => Some(*date),
            _ => None,
        }
    }
}

/// Normalizes an incoming value to the representation the slot stores, so
/// that equality checks against the current value are meaningful.
pub fn normalize(kind: FieldKind, value: FieldValue) -> FieldValue {
    match (kind, value) {
        (FieldKind::Decimal, FieldValue::Integer(n)) => FieldValue::Number(n as f64),
        (_, other) => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_rejects_negative_integers() {
        assert!(FieldKind::Count.accepts(&FieldValue::Integer(3)));
        assert!(!FieldKind::Count.accepts(&FieldValue::Integer(-1)));
        assert!(!FieldKind::Count.accepts(&FieldValue::Number(3.0)));
    }

    #[test]
    fn decimal_accepts_integers_but_not_nan() {
        assert!(FieldKind::Decimal.accepts(&FieldValue::Integer(8)));
        assert!(!FieldKind::Decimal.accepts(&FieldValue::Number(f64::NAN)));
        assert_eq!(
            normalize(FieldKind::Decimal, FieldValue::Integer(8)),
            FieldValue::Number(8.0)
        );
    }

    #[test]
    fn dates_serialize_as_iso_strings() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let json = serde_json::to_value(FieldValue::Date(date)).unwrap();
        assert_eq!(json, serde_json::json!("2024-03-01"));
    }
}
