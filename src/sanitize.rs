//! Recursive cleanup of JSON values before they are persisted.
//!
//! `None` is the "absent" outcome: the caller drops the element it came from.

use serde_json::{Map, Value};

use crate::util::is_blank;

/// Branches nested deeper than this are treated as absent.
pub const MAX_SANITIZE_DEPTH: usize = 256;

/// Removes blank keys and vacuous array elements from `value`.
///
/// Array elements that clean down to an empty object are dropped. Object
/// entries keep their empty-object values; only the record-level check in
/// the writer looks at emptiness, and it only counts top-level keys.
pub fn sanitize(value: &Value) -> Option<Value> {
    sanitize_at(value, 0)
}

fn sanitize_at(value: &Value, depth: usize) -> Option<Value> {
    if depth > MAX_SANITIZE_DEPTH {
        return None;
    }

    match value {
        Value::Array(items) => Some(Value::Array(
            items
                .iter()
                .filter_map(|item| sanitize_element(item, depth + 1))
                .collect(),
        )),
        Value::Object(entries) => Some(Value::Object(sanitize_entries(entries, depth + 1))),
        scalar => Some(scalar.clone()),
    }
}

fn sanitize_element(item: &Value, depth: usize) -> Option<Value> {
    let cleaned = sanitize_at(item, depth)?;
    if is_empty_object(&cleaned) {
        return None;
    }
    Some(cleaned)
}

fn sanitize_entries(entries: &Map<String, Value>, depth: usize) -> Map<String, Value> {
    let mut clean = Map::new();
    for (key, value) in entries {
        if is_blank(key) {
            continue;
        }
        if let Some(sanitized) = sanitize_at(value, depth) {
            clean.insert(key.clone(), sanitized);
        }
    }
    clean
}

fn is_empty_object(value: &Value) -> bool {
    value.as_object().is_some_and(Map::is_empty)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn drops_blank_and_whitespace_keys() {
        let cleaned = sanitize(&json!({ "": 1, " ": 2, "x": 3 }));
        assert_eq!(cleaned, Some(json!({ "x": 3 })));
    }

    #[test]
    fn drops_empty_array_elements_and_keeps_order() {
        let cleaned = sanitize(&json!([{}, { "a": 1 }, {}, { "b": 2 }]));
        assert_eq!(cleaned, Some(json!([{ "a": 1 }, { "b": 2 }])));
    }

    #[test]
    fn array_element_emptied_by_blank_keys_is_dropped() {
        let cleaned = sanitize(&json!([{ " ": "gone" }, 3]));
        assert_eq!(cleaned, Some(json!([3])));
    }

    #[test]
    fn scalars_pass_through_unchanged() {
        for value in [json!(null), json!(true), json!(4.5), json!(-7), json!("text")] {
            assert_eq!(sanitize(&value), Some(value.clone()));
        }
    }

    #[test]
    fn nested_empty_objects_inside_objects_survive() {
        let cleaned = sanitize(&json!({ "a": {}, "b": { "": 1 } }));
        assert_eq!(cleaned, Some(json!({ "a": {}, "b": {} })));
    }

    #[test]
    fn cleans_nested_structures_recursively() {
        let cleaned = sanitize(&json!({
            "loot": [{ "": "x" }, { "name": "gear", " ": null }],
            "stats": { "hp": 10, "\t": 0, "tags": ["a", {}] }
        }));

        assert_eq!(
            cleaned,
            Some(json!({
                "loot": [{ "name": "gear" }],
                "stats": { "hp": 10, "tags": ["a"] }
            }))
        );
    }

    #[test]
    fn branches_past_depth_limit_are_absent() {
        let mut deep = json!({ "leaf": 1 });
        for _ in 0..(MAX_SANITIZE_DEPTH + 5) {
            deep = json!({ "next": deep });
        }

        let cleaned = sanitize(&deep).unwrap();

        let mut cursor = &cleaned;
        let mut levels = 0;
        while let Some(next) = cursor.get("next") {
            cursor = next;
            levels += 1;
        }
        assert!(levels < MAX_SANITIZE_DEPTH + 5);
        assert!(cursor.get("leaf").is_none());
    }
}
