use serde_json::{Map, Value};

/// Keywords that only annotate a schema and don't shape its type.
const ANNOTATION_KEYWORDS: [&str; 10] = [
    "$ref",
    "$comment",
    "$id",
    "$schema",
    "description",
    "title",
    "examples",
    "default",
    "deprecated",
    "readOnly",
];

/// Check if a JSON object has composition keywords: allOf, oneOf, anyOf.
pub fn has_composition_keywords(json_object: &Map<String, Value>) -> bool {
    json_object.contains_key("allOf")
        || json_object.contains_key("oneOf")
        || json_object.contains_key("anyOf")
}

/// Check if a schema looks like a schema rather than a group of definitions.
pub fn is_schema_like(value: &Value) -> bool {
    value.as_object().is_some_and(|obj| {
        obj.contains_key("type")
            || obj.contains_key("properties")
            || obj.contains_key("enum")
            || obj.contains_key("$ref")
            || has_composition_keywords(obj)
    })
}

/// `type` equals `name`, or is a list containing it.
pub fn type_includes(json_object: &Map<String, Value>, name: &str) -> bool {
    match json_object.get("type") {
        Some(Value::String(t)) => t == name,
        Some(Value::Array(types)) => types.iter().any(|t| t.as_str() == Some(name)),
        _ => false,
    }
}

/// A resolved fragment is standalone (worth caching as a named type) if it
/// will convert into a record or enum.
pub fn is_standalone_fragment(fragment: &Value) -> bool {
    let Some(obj) = fragment.as_object() else {
        return false;
    };
    obj.get("type").and_then(Value::as_str) == Some("object")
        || obj.contains_key("properties")
        || obj.contains_key("enum")
        || obj.contains_key("allOf")
        || obj.contains_key("anyOf")
        || obj
            .get("oneOf")
            .and_then(Value::as_array)
            .is_some_and(|options| options.len() <= 1)
}

/// A `$ref` node without sibling keys that would change the referenced type.
pub fn is_bare_reference(json_object: &Map<String, Value>) -> bool {
    json_object
        .keys()
        .all(|k| ANNOTATION_KEYWORDS.contains(&k.as_str()))
}

/// Strings listed in `required`.
pub fn required_fields(json_object: &Map<String, Value>) -> Vec<&str> {
    json_object
        .get("required")
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}
