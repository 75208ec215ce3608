//! Field accessors over untyped records.
//!
//! Every lookup may find the field absent. Absence is a normal outcome and is
//! reported as `None` / [`Weight::Absent`], never as a panic or an error.
//! A JSON `null` counts as absent.

use serde_json::Value;

use crate::model::Record;

/// Resolved weight of a record.
#[derive(Debug, Clone, PartialEq)]
pub enum Weight {
    Value { field: String, value: f64 },
    Absent,
    NonNumeric { field: String, value: String },
}

/// The raw value of `field`, if present and not `null`.
pub fn field<'a>(record: &'a Record, field: &str) -> Option<&'a Value> {
    record.get(field).filter(|v| !v.is_null())
}

/// The first present field among `aliases`, with the alias that matched.
pub fn first_present<'a, 'b>(record: &'a Record, aliases: &'b [String]) -> Option<(&'b str, &'a Value)> {
    aliases
        .iter()
        .find_map(|alias| field(record, alias).map(|v| (alias.as_str(), v)))
}

pub fn has_field(record: &Record, name: &str) -> bool {
    field(record, name).is_some()
}

/// Grouping-key text: strings as-is, numbers and booleans by their JSON text.
pub fn text(record: &Record, name: &str) -> Option<String> {
    match field(record, name)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

pub fn field_equals(record: &Record, name: &str, expected: &str) -> bool {
    matches!(field(record, name), Some(Value::String(s)) if s == expected)
}

/// Resolve a weight through an alias list. Only JSON numbers are numeric.
pub fn weight(record: &Record, aliases: &[String]) -> Weight {
    match first_present(record, aliases) {
        None => Weight::Absent,
        Some((alias, Value::Number(n))) => match n.as_f64() {
            Some(value) => Weight::Value {
                field: alias.to_string(),
                value,
            },
            None => Weight::NonNumeric {
                field: alias.to_string(),
                value: n.to_string(),
            },
        },
        Some((alias, other)) => Weight::NonNumeric {
            field: alias.to_string(),
            value: other.to_string(),
        },
    }
}
