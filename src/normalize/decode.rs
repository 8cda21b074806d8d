//! Structured decode: the first of the two steps for JSON tasks.
//!
//! A mismatch here is not an error for the caller; the normalizer turns it
//! into the task's partial-failure result (rescue extraction for Analyze).

use serde_json::{Map, Value};

/// Model text did not have the expected structured shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeMismatch {
    #[error("reply is not JSON: {0}")]
    NotJson(String),

    #[error("reply is JSON but not an object")]
    NotAnObject,
}

/// Decode `text` as a JSON object.
///
/// If the whole text is not JSON, the span from the first `{` to the last `}`
/// is tried as well; that embedded object is only accepted when it carries at
/// least one of `expected` keys, so stray braces in prose or code do not
/// count as a structured reply.
pub fn decode_object(text: &str, expected: &[&str]) -> Result<Map<String, Value>, DecodeMismatch> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(DecodeMismatch::NotAnObject),
        Err(e) => embedded_object(text, expected).ok_or_else(|| DecodeMismatch::NotJson(e.to_string())),
    }
}

fn embedded_object(text: &str, expected: &[&str]) -> Option<Map<String, Value>> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    match serde_json::from_str::<Value>(&text[start..=end]) {
        Ok(Value::Object(map)) if expected.iter().any(|k| map.contains_key(*k)) => Some(map),
        _ => None,
    }
}

/// Read a scalar field as text. Null, blank strings and containers count as absent.
pub fn string_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Read a list of strings. A lone string is treated as a one-element list.
pub fn string_list(obj: &Map<String, Value>, key: &str) -> Vec<String> {
    let items: Vec<String> = match obj.get(key) {
        Some(Value::Array(items)) => items.iter().filter_map(scalar_text).collect(),
        Some(other) => scalar_text(other).into_iter().collect(),
        None => Vec::new(),
    };
    items
        .into_iter()
        .filter(|s| !s.trim().is_empty())
        .collect()
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_object() {
        let map = decode_object(r#"{"time_complexity": "O(n)"}"#, &["time_complexity"]).unwrap();
        assert_eq!(string_field(&map, "time_complexity").as_deref(), Some("O(n)"));
    }

    #[test]
    fn test_non_object_json() {
        assert_eq!(
            decode_object("[1, 2]", &["x"]),
            Err(DecodeMismatch::NotAnObject)
        );
    }

    #[test]
    fn test_prose_is_not_json() {
        assert!(matches!(
            decode_object("The time complexity is O(n).", &["time_complexity"]),
            Err(DecodeMismatch::NotJson(_))
        ));
    }

    #[test]
    fn test_embedded_object_with_expected_key() {
        let text = "Here is the result:\n{\"optimized_code\": \"x\", \"improvements\": []}\nHope it helps!";
        let map = decode_object(text, &["optimized_code", "improvements"]).unwrap();
        assert_eq!(string_field(&map, "optimized_code").as_deref(), Some("x"));
    }

    #[test]
    fn test_embedded_braces_without_expected_keys_are_rejected() {
        let text = "public class Main { public static void main(String[] a) {} }";
        assert!(decode_object(text, &["converted_code"]).is_err());
        let text = "Result: {\"unrelated\": 1} done";
        assert!(decode_object(text, &["converted_code"]).is_err());
    }

    #[test]
    fn test_string_field_absent_cases() {
        let map = decode_object(
            r#"{"a": null, "b": "  ", "c": [1], "d": 3, "e": true}"#,
            &[],
        )
        .unwrap();
        assert_eq!(string_field(&map, "a"), None);
        assert_eq!(string_field(&map, "b"), None);
        assert_eq!(string_field(&map, "c"), None);
        assert_eq!(string_field(&map, "d").as_deref(), Some("3"));
        assert_eq!(string_field(&map, "e").as_deref(), Some("true"));
        assert_eq!(string_field(&map, "missing"), None);
    }

    #[test]
    fn test_string_list_shapes() {
        let map = decode_object(
            r#"{"list": ["a", "", 2, {"x": 1}], "single": "only", "none": null}"#,
            &[],
        )
        .unwrap();
        assert_eq!(string_list(&map, "list"), vec!["a", "2"]);
        assert_eq!(string_list(&map, "single"), vec!["only"]);
        assert!(string_list(&map, "none").is_empty());
        assert!(string_list(&map, "missing").is_empty());
    }
}
