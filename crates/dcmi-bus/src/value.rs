//! Property values exchanged with the bus.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// All properties of one interface, keyed by property name.
pub type PropertyMap = BTreeMap<String, Value>;

/// A decoded property value.
///
/// Serialised as `{"type": "...", "value": ...}` so the bridge can map each
/// variant onto the matching bus signature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Value {
    /// Boolean.
    Bool(bool),
    /// Signed integer of any width.
    Int(i64),
    /// Unsigned integer of any width.
    UInt(u64),
    /// Double precision float.
    Double(f64),
    /// UTF-8 string (object paths and enumerations included).
    String(String),
    /// Array of strings.
    #[serde(rename = "string_array")]
    StringArray(Vec<String>),
}

impl Value {
    /// Short name of the variant, used in diagnostics.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::UInt(_) => "uint",
            Self::Double(_) => "double",
            Self::String(_) => "string",
            Self::StringArray(_) => "string_array",
        }
    }

    /// Returns the string payload.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(text) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Returns the boolean payload.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(flag) => Some(*flag),
            _ => None,
        }
    }

    /// Returns a non-negative numeric payload as an unsigned integer.
    ///
    /// Doubles are rounded to the nearest integer; negative or non-finite
    /// values yield `None`.
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::UInt(number) => Some(*number),
            Self::Int(number) => u64::try_from(*number).ok(),
            Self::Double(number) => double_to_u64(*number),
            _ => None,
        }
    }
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "the value is range checked before the cast"
)]
fn double_to_u64(number: f64) -> Option<u64> {
    let rounded = number.round();
    if !rounded.is_finite() || rounded < 0.0 || rounded >= 18_446_744_073_709_551_616.0 {
        return None;
    }
    Some(rounded as u64)
}

impl From<bool> for Value {
    fn from(flag: bool) -> Self {
        Self::Bool(flag)
    }
}

impl From<u64> for Value {
    fn from(number: u64) -> Self {
        Self::UInt(number)
    }
}

impl From<i64> for Value {
    fn from(number: i64) -> Self {
        Self::Int(number)
    }
}

impl From<f64> for Value {
    fn from(number: f64) -> Self {
        Self::Double(number)
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Self::String(text)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Self::String(text.to_owned())
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Self::StringArray(items)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(Value::UInt(120), Some(120))]
    #[case(Value::Int(80), Some(80))]
    #[case(Value::Int(-1), None)]
    #[case(Value::Double(109.6), Some(110))]
    #[case(Value::Double(f64::NAN), None)]
    #[case(Value::from("120"), None)]
    fn converts_numeric_payloads(#[case] value: Value, #[case] expected: Option<u64>) {
        assert_eq!(value.as_u64(), expected);
    }

    #[rstest]
    #[case(Value::Bool(true), r#"{"type":"bool","value":true}"#)]
    #[case(Value::Int(-3), r#"{"type":"int","value":-3}"#)]
    #[case(Value::UInt(120), r#"{"type":"uint","value":120}"#)]
    #[case(Value::Double(1.5), r#"{"type":"double","value":1.5}"#)]
    #[case(Value::from("tag"), r#"{"type":"string","value":"tag"}"#)]
    #[case(
        Value::from(vec!["a".to_owned()]),
        r#"{"type":"string_array","value":["a"]}"#
    )]
    fn wire_tag_matches_type_name(#[case] value: Value, #[case] json: &str) {
        assert_eq!(serde_json::to_string(&value).expect("serialise"), json);
        let back: Value = serde_json::from_str(json).expect("deserialise");
        assert_eq!(back, value);

        let tagged: serde_json::Value = serde_json::from_str(json).expect("parse");
        assert_eq!(tagged["type"], value.type_name());
    }
}
