use serde_json::{Map, Value};
use tracing::warn;

use crate::converter::merging::{merge_any_of, merge_json_schemas, merge_one_of};
use crate::converter::references::local_fragment;

/// Conditional keywords that Avro has no way to express.
const UNSUPPORTED_KEYWORDS: [&str; 5] =
    ["if", "then", "else", "dependentSchemas", "dependentRequired"];

/// Remove conditional keywords from a schema object, warning if any were present.
///
/// Returns `None` when there was nothing to strip.
pub fn strip_unsupported(json_object: &Map<String, Value>) -> Option<Map<String, Value>> {
    if !UNSUPPORTED_KEYWORDS
        .iter()
        .any(|k| json_object.contains_key(*k))
    {
        return None;
    }
    warn!("Conditional schema is not supported and will be ignored");
    let mut stripped = json_object.clone();
    for keyword in UNSUPPORTED_KEYWORDS {
        stripped.remove(keyword);
    }
    Some(stripped)
}

/// Expand `allOf`, `oneOf` and `anyOf` into candidate schemas.
///
/// Keywords apply in sequence over the node's own keys (the base):
/// - `allOf` deep-merges the base with every member into one candidate,
/// - `oneOf` lays each option over every candidate so far (or the base),
///   giving one alternative per combination,
/// - `anyOf` merges its branches into every candidate (or the base),
///   keeping only the fields every branch requires.
///
/// Members of `allOf`/`anyOf` that are document-local `$ref`s are
/// dereferenced against `document` before merging.
pub fn expand_composition(json_object: &Map<String, Value>, document: &Value) -> Vec<Value> {
    let mut base = json_object.clone();
    base.remove("allOf");
    base.remove("oneOf");
    base.remove("anyOf");

    let mut candidates: Vec<Value> = Vec::new();

    if let Some(Value::Array(all_of)) = json_object.get("allOf") {
        let mut type_list = vec![Value::Object(base.clone())];
        type_list.extend(all_of.iter().map(|s| dereference_local(s, document)));
        candidates.push(merge_json_schemas(&type_list));
    }

    if let Some(Value::Array(one_of)) = json_object.get("oneOf") {
        let bases = candidate_objects(&candidates, &base);
        candidates = one_of
            .iter()
            .flat_map(|option| bases.iter().map(move |b| merge_one_of(b, option)))
            .collect();
    }

    if let Some(Value::Array(any_of)) = json_object.get("anyOf") {
        let branches: Vec<Value> = any_of
            .iter()
            .map(|s| dereference_local(s, document))
            .collect();
        let bases = candidate_objects(&candidates, &base);
        candidates = bases
            .iter()
            .map(|b| merge_any_of(b, &branches))
            .collect();
    }

    candidates
}

fn candidate_objects(candidates: &[Value], base: &Map<String, Value>) -> Vec<Map<String, Value>> {
    if candidates.is_empty() {
        return vec![base.clone()];
    }
    candidates
        .iter()
        .map(|c| match c {
            Value::Object(obj) => obj.clone(),
            other => {
                let mut wrapped = Map::new();
                wrapped.insert("type".to_string(), other.clone());
                wrapped
            }
        })
        .collect()
}

/// Replace a local `{"$ref": "#/..."}` with the fragment it points at,
/// keeping any sibling keys of the reference.
fn dereference_local(schema: &Value, document: &Value) -> Value {
    let Some(obj) = schema.as_object() else {
        return schema.clone();
    };
    let Some(reference) = obj.get("$ref").and_then(Value::as_str) else {
        return schema.clone();
    };
    if !reference.starts_with('#') {
        return schema.clone();
    }
    match local_fragment(document, reference) {
        Some(fragment @ Value::Object(_)) => {
            let mut siblings = obj.clone();
            siblings.remove("$ref");
            merge_json_schemas(&[fragment.clone(), Value::Object(siblings)])
        }
        _ => schema.clone(),
    }
}
