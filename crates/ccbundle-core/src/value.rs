//! Tagged configuration values

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A settings value, tagged by shape
///
/// Deserializes from any JSON value: booleans, numbers, and strings get their
/// own variants, everything else (arrays, objects, null) is `Structured`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
    Structured(Value),
}

impl SettingValue {
    /// Short type name shown as a row tag
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::Text(_) => "string",
            Self::Structured(Value::Array(_)) => "list",
            Self::Structured(Value::Null) => "null",
            Self::Structured(_) => "object",
        }
    }

    /// Back to plain JSON
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Bool(b) => Value::Bool(*b),
            Self::Number(n) => Value::Number(n.clone()),
            Self::Text(s) => Value::String(s.clone()),
            Self::Structured(v) => v.clone(),
        }
    }

    /// One-line rendering, cut to `max_chars`
    #[must_use]
    pub fn preview(&self, max_chars: usize) -> String {
        let full = match self {
            Self::Bool(b) => b.to_string(),
            Self::Number(n) => n.to_string(),
            Self::Text(s) => format!("\"{s}\""),
            Self::Structured(v) => v.to_string(),
        };
        truncate(&full, max_chars)
    }
}

impl From<Value> for SettingValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(n),
            Value::String(s) => Self::Text(s),
            other => Self::Structured(other),
        }
    }
}

/// Cut `text` to at most `max_chars` characters, ending in `…` when cut
#[must_use]
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    if max_chars == 0 {
        return String::new();
    }
    let mut out: String = text.chars().take(max_chars - 1).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_picks_variant() {
        assert_eq!(SettingValue::from(json!(true)), SettingValue::Bool(true));
        assert_eq!(SettingValue::from(json!("opus")).kind(), "string");
        assert_eq!(SettingValue::from(json!(3)).kind(), "number");
        assert_eq!(SettingValue::from(json!([1])).kind(), "list");
        assert_eq!(SettingValue::from(json!({"a": 1})).kind(), "object");
    }

    #[test]
    fn test_untagged_deserialize_matches_from() {
        let v: SettingValue = serde_json::from_str("{\"x\": [1, 2]}").unwrap();
        assert_eq!(v, SettingValue::Structured(json!({"x": [1, 2]})));
        let v: SettingValue = serde_json::from_str("false").unwrap();
        assert_eq!(v, SettingValue::Bool(false));
    }

    #[test]
    fn test_preview_truncates() {
        let v = SettingValue::from(json!({"statusLine": {"type": "command", "command": "x"}}));
        let preview = v.preview(12);
        assert_eq!(preview.chars().count(), 12);
        assert!(preview.ends_with('…'));
        assert_eq!(SettingValue::Text("opus".into()).preview(40), "\"opus\"");
    }
}
