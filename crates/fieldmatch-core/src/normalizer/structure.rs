//! Structural compatibility between an original document and a rewrite
//!
//! A rewrite is compatible when every key of the original is still present
//! at the same path and holds a value of the same JSON type. New keys and
//! extra array elements are allowed. A `null` in the original may only stay
//! `null` or become an object.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureCheck {
    pub is_valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StructureCheck {
    fn ok() -> Self {
        Self {
            is_valid: true,
            error: None,
        }
    }

    fn failed(error: String) -> Self {
        Self {
            is_valid: false,
            error: Some(error),
        }
    }
}

/// Verify `updated` keeps the shape of `original`
pub fn check_structure(original: &Value, updated: &Value) -> StructureCheck {
    match compare(original, updated, "") {
        Some(error) => StructureCheck::failed(error),
        None => StructureCheck::ok(),
    }
}

/// String form of [`check_structure`]; unparseable input is incompatible
pub fn check_structure_str(original: &str, updated: &str) -> StructureCheck {
    let original = match serde_json::from_str::<Value>(original) {
        Ok(value) => value,
        Err(e) => return StructureCheck::failed(format!("Original is not valid JSON: {}", e)),
    };
    let updated = match serde_json::from_str::<Value>(updated) {
        Ok(value) => value,
        Err(e) => return StructureCheck::failed(format!("Updated is not valid JSON: {}", e)),
    };
    check_structure(&original, &updated)
}

fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "root"
    } else {
        path
    }
}

fn child_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn compare(original: &Value, updated: &Value, path: &str) -> Option<String> {
    match (original, updated) {
        (Value::Null, Value::Null) | (Value::Null, Value::Object(_)) => None,
        (Value::Array(_), Value::Object(_))
        | (Value::Object(_), Value::Array(_))
        | (Value::Null, Value::Array(_)) => {
            Some(format!("Array structure mismatch at {}", display_path(path)))
        }
        (Value::Object(orig), Value::Object(upd)) => {
            for (key, orig_value) in orig {
                match upd.get(key) {
                    Some(upd_value) => {
                        if let Some(error) = compare(orig_value, upd_value, &child_path(path, key)) {
                            return Some(error);
                        }
                    }
                    None => {
                        return Some(format!(
                            "Missing property \"{}\" at {}",
                            key,
                            display_path(path)
                        ))
                    }
                }
            }
            None
        }
        (Value::Array(orig), Value::Array(upd)) => {
            for (index, orig_value) in orig.iter().enumerate() {
                let key = index.to_string();
                match upd.get(index) {
                    Some(upd_value) => {
                        if let Some(error) = compare(orig_value, upd_value, &child_path(path, &key)) {
                            return Some(error);
                        }
                    }
                    None => {
                        return Some(format!(
                            "Missing property \"{}\" at {}",
                            key,
                            display_path(path)
                        ))
                    }
                }
            }
            None
        }
        _ if kind(original) != kind(updated) => Some(format!(
            "Type mismatch at {}: expected {}, found {}",
            display_path(path),
            kind(original),
            kind(updated)
        )),
        _ => None,
    }
}
