//! Deterministic application of matches to a JSON value
//!
//! A match property is a dotted path. Object levels that do not exist yet
//! are created; numeric segments index into arrays that already exist. Only
//! scalar and null leaves are replaced. A path that ends on an object or
//! array, runs through an existing scalar, or indexes past the end of an
//! array is skipped and reported.

use crate::types::MatchResult;
use serde_json::{Map, Number, Value};
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    EmptyPath,
    /// Already written by a match with higher confidence
    Superseded,
    /// The path runs through a value that cannot hold children
    NotAContainer { segment: String },
    IndexOutOfRange { segment: String },
    /// The leaf holds an object or array, which a text match cannot replace
    ContainerLeaf { segment: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::EmptyPath => f.write_str("empty property path"),
            SkipReason::Superseded => f.write_str("superseded by a higher-confidence match"),
            SkipReason::NotAContainer { segment } => {
                write!(f, "\"{}\" is not an object or array", segment)
            }
            SkipReason::IndexOutOfRange { segment } => {
                write!(f, "no array element at \"{}\"", segment)
            }
            SkipReason::ContainerLeaf { segment } => {
                write!(f, "\"{}\" holds an object or array", segment)
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplySummary {
    pub applied: Vec<String>,
    pub skipped: Vec<(String, SkipReason)>,
}

/// Write every match into `root`, highest confidence first
///
/// `matches` must already be filtered and sorted; the first match written
/// for a property wins and later ones are reported as superseded.
pub fn apply_matches(root: &mut Value, matches: &[MatchResult]) -> ApplySummary {
    let mut summary = ApplySummary::default();
    let mut written = HashSet::new();

    for m in matches {
        if written.contains(m.property.as_str()) {
            summary
                .skipped
                .push((m.property.clone(), SkipReason::Superseded));
            continue;
        }
        match set_path(root, &m.property, &m.matched_text) {
            Ok(()) => {
                written.insert(m.property.as_str());
                summary.applied.push(m.property.clone());
            }
            Err(reason) => summary.skipped.push((m.property.clone(), reason)),
        }
    }
    summary
}

/// Set the leaf at `path` to `text`, coerced to the type of the value it replaces
pub fn set_path(root: &mut Value, path: &str, text: &str) -> Result<(), SkipReason> {
    let segments: Vec<&str> = path.split('.').map(str::trim).collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(SkipReason::EmptyPath);
    }
    let Some((leaf, parents)) = segments.split_last() else {
        return Err(SkipReason::EmptyPath);
    };

    let mut current = root;
    for segment in parents {
        current = descend(current, segment)?;
    }
    assign(current, leaf, text)
}

fn descend<'a>(current: &'a mut Value, segment: &str) -> Result<&'a mut Value, SkipReason> {
    if current.is_null() {
        *current = Value::Object(Map::new());
    }
    match current {
        Value::Object(map) => Ok(map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()))),
        Value::Array(items) => element(items, segment),
        _ => Err(SkipReason::NotAContainer {
            segment: segment.to_string(),
        }),
    }
}

fn element<'a>(items: &'a mut [Value], segment: &str) -> Result<&'a mut Value, SkipReason> {
    let out_of_range = || SkipReason::IndexOutOfRange {
        segment: segment.to_string(),
    };
    let index = segment.parse::<usize>().map_err(|_| out_of_range())?;
    items.get_mut(index).ok_or_else(out_of_range)
}

fn assign(container: &mut Value, leaf: &str, text: &str) -> Result<(), SkipReason> {
    if container.is_null() {
        *container = Value::Object(Map::new());
    }
    match container {
        Value::Object(map) => {
            let previous = map.get(leaf);
            ensure_scalar(previous, leaf)?;
            let value = coerce(previous, text);
            map.insert(leaf.to_string(), value);
            Ok(())
        }
        Value::Array(items) => {
            let slot = element(items, leaf)?;
            ensure_scalar(Some(&*slot), leaf)?;
            *slot = coerce(Some(&*slot), text);
            Ok(())
        }
        _ => Err(SkipReason::NotAContainer {
            segment: leaf.to_string(),
        }),
    }
}

fn ensure_scalar(previous: Option<&Value>, leaf: &str) -> Result<(), SkipReason> {
    match previous {
        Some(Value::Object(_)) | Some(Value::Array(_)) => Err(SkipReason::ContainerLeaf {
            segment: leaf.to_string(),
        }),
        _ => Ok(()),
    }
}

/// Convert matched text to the type of the value being replaced
///
/// Numbers keep the previous value when the text is not numeric; booleans
/// are true only for the text "true" in any case. Everything else, including
/// new properties, becomes the trimmed string.
pub fn coerce(previous: Option<&Value>, text: &str) -> Value {
    let trimmed = text.trim();
    match previous {
        Some(Value::Number(prev)) => parse_number(trimmed)
            .map(Value::Number)
            .unwrap_or_else(|| Value::Number(prev.clone())),
        Some(Value::Bool(_)) => Value::Bool(trimmed.eq_ignore_ascii_case("true")),
        _ => Value::String(trimmed.to_string()),
    }
}

fn parse_number(text: &str) -> Option<Number> {
    if text.is_empty() {
        return None;
    }
    if let Ok(n) = text.parse::<i64>() {
        return Some(Number::from(n));
    }
    if let Ok(n) = text.parse::<u64>() {
        return Some(Number::from(n));
    }
    text.parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .and_then(Number::from_f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MatchPosition, MatchType};
    use serde_json::json;

    fn m(property: &str, text: &str, confidence: u8) -> MatchResult {
        MatchResult::new(
            property,
            text,
            MatchPosition::new(0, text.chars().count()),
            confidence,
            MatchType::from_confidence(confidence),
        )
    }

    #[test]
    fn test_coerce_follows_previous_type() {
        assert_eq!(coerce(Some(&json!(0)), " 30 "), json!(30));
        assert_eq!(coerce(Some(&json!(0)), "2.5"), json!(2.5));
        assert_eq!(coerce(Some(&json!(7)), "thirty"), json!(7));
        assert_eq!(coerce(Some(&json!(7)), ""), json!(7));
        assert_eq!(coerce(Some(&json!(false)), "TRUE"), json!(true));
        assert_eq!(coerce(Some(&json!(true)), "yes"), json!(false));
        assert_eq!(coerce(Some(&json!("")), "  John "), json!("John"));
        assert_eq!(coerce(Some(&Value::Null), "42"), json!("42"));
        assert_eq!(coerce(None, "42"), json!("42"));
    }

    #[test]
    fn test_set_path_top_level() {
        let mut value = json!({"name": "", "age": 0});
        set_path(&mut value, "name", "John Smith").unwrap();
        set_path(&mut value, "age", "30").unwrap();
        assert_eq!(value, json!({"name": "John Smith", "age": 30}));
        assert_eq!(serde_json::to_string(&value).unwrap(), r#"{"name":"John Smith","age":30}"#);
    }

    #[test]
    fn test_set_path_creates_missing_levels() {
        let mut value = json!({"address": {"street": "Main St"}});
        set_path(&mut value, "address.city", "Paris").unwrap();
        set_path(&mut value, "contact.email.work", "a@b.c").unwrap();
        assert_eq!(
            value,
            json!({
                "address": {"street": "Main St", "city": "Paris"},
                "contact": {"email": {"work": "a@b.c"}}
            })
        );
    }

    #[test]
    fn test_set_path_indexes_arrays() {
        let mut value = json!({"items": [{"qty": 1}, {"qty": 2}], "tags": ["a", "b"]});
        set_path(&mut value, "items.1.qty", "5").unwrap();
        set_path(&mut value, "tags.0", "z").unwrap();
        assert_eq!(value, json!({"items": [{"qty": 1}, {"qty": 5}], "tags": ["z", "b"]}));

        assert_eq!(
            set_path(&mut value, "items.9.qty", "1"),
            Err(SkipReason::IndexOutOfRange {
                segment: "9".to_string()
            })
        );
        assert!(set_path(&mut value, "tags.first", "x").is_err());
    }

    #[test]
    fn test_set_path_through_scalar_is_skipped() {
        let mut value = json!({"name": "John"});
        let before = value.clone();
        assert_eq!(
            set_path(&mut value, "name.first", "J"),
            Err(SkipReason::NotAContainer {
                segment: "first".to_string()
            })
        );
        assert_eq!(value, before);
    }

    #[test]
    fn test_set_path_null_becomes_object() {
        let mut value = json!({"address": null});
        set_path(&mut value, "address.city", "Oslo").unwrap();
        assert_eq!(value, json!({"address": {"city": "Oslo"}}));
    }

    #[test]
    fn test_set_path_empty_segments() {
        let mut value = json!({});
        assert_eq!(set_path(&mut value, "", "x"), Err(SkipReason::EmptyPath));
        assert_eq!(set_path(&mut value, "a..b", "x"), Err(SkipReason::EmptyPath));
        assert_eq!(value, json!({}));
    }

    #[test]
    fn test_apply_matches_first_writer_wins() {
        let mut value = json!({"name": ""});
        let matches = vec![m("name", "John Smith", 95), m("name", "John", 60)];
        let summary = apply_matches(&mut value, &matches);
        assert_eq!(value, json!({"name": "John Smith"}));
        assert_eq!(summary.applied, vec!["name".to_string()]);
        assert_eq!(
            summary.skipped,
            vec![("name".to_string(), SkipReason::Superseded)]
        );
    }

    #[test]
    fn test_set_path_keeps_container_leaves() {
        let mut value = json!({"address": {"city": "", "zip": ""}, "tags": [["a"], "b"]});
        let before = value.clone();
        assert_eq!(
            set_path(&mut value, "address", "12 Main St, Oslo 0150"),
            Err(SkipReason::ContainerLeaf {
                segment: "address".to_string()
            })
        );
        assert_eq!(
            set_path(&mut value, "tags.0", "x"),
            Err(SkipReason::ContainerLeaf {
                segment: "0".to_string()
            })
        );
        assert_eq!(value, before);
    }

    #[test]
    fn test_apply_matches_skips_container_then_fills_child() {
        let mut value = json!({"address": {"city": "", "zip": ""}, "name": ""});
        let matches = vec![
            m("address", "12 Main St, Oslo 0150", 80),
            m("address.city", "Oslo", 70),
        ];
        let summary = apply_matches(&mut value, &matches);
        assert_eq!(
            value,
            json!({"address": {"city": "Oslo", "zip": ""}, "name": ""})
        );
        assert_eq!(summary.applied, vec!["address.city".to_string()]);
        assert_eq!(
            summary.skipped,
            vec![(
                "address".to_string(),
                SkipReason::ContainerLeaf {
                    segment: "address".to_string()
                }
            )]
        );
    }
}
