use crate::avro::{AvroType, EnumType, RecordType};
use crate::converter::analysis::required_fields;
use crate::converter::unions::{flatten_union, union_of};
use serde_json::{Map, Value};
use tracing::warn;

/// Keys whose first value wins when fragments collide.
const FIRST_WINS: [&str; 7] = [
    "title",
    "description",
    "$comment",
    "$id",
    "$schema",
    "default",
    "examples",
];

/// Deep-merge multiple JSON schemas into one (`allOf` semantics).
///
/// Object-valued keys are merged recursively, list-valued keys are unioned by
/// membership and colliding scalars become a two-element list, so a `type`
/// collision turns into a `type` list. `required` sets are unioned.
pub fn merge_json_schemas(json_schemas: &[Value]) -> Value {
    let mut merged = Map::new();
    for schema in json_schemas {
        if let Some(obj) = schema.as_object() {
            merge_structures(&mut merged, obj);
        }
    }
    Value::Object(merged)
}

fn merge_structures(target: &mut Map<String, Value>, source: &Map<String, Value>) {
    for (key, value) in source {
        match target.get_mut(key) {
            None => {
                target.insert(key.clone(), value.clone());
            }
            Some(existing) if existing == value => {}
            Some(existing) => merge_value(key, existing, value),
        }
    }
}

fn merge_value(key: &str, existing: &mut Value, value: &Value) {
    if FIRST_WINS.contains(&key) {
        return;
    }
    if key == "$ref" {
        warn!("Conflicting $ref values {existing} and {value} in merged schema, keeping the first");
        return;
    }
    if let (Value::Object(a), Value::Object(b)) = (&mut *existing, value) {
        merge_structures(a, b);
        return;
    }
    let mut items = match existing.take() {
        Value::Array(items) => items,
        other => vec![other],
    };
    let incoming = match value {
        Value::Array(more) => more.as_slice(),
        single => std::slice::from_ref(single),
    };
    for v in incoming {
        if !items.contains(v) {
            items.push(v.clone());
        }
    }
    *existing = Value::Array(items);
}

/// Merge `anyOf` branches into the base schema as one schema.
///
/// Properties from later branches overwrite earlier ones of the same name.
/// A field stays required only if every branch requires it; fields the base
/// itself requires stay required.
pub fn merge_any_of(base: &Map<String, Value>, branches: &[Value]) -> Value {
    let mut merged = base.clone();
    let mut intersection: Option<Vec<String>> = None;

    for branch in branches {
        let Some(obj) = branch.as_object() else {
            intersection = Some(Vec::new());
            continue;
        };
        let branch_required: Vec<String> =
            required_fields(obj).into_iter().map(str::to_string).collect();
        intersection = Some(match intersection {
            None => branch_required,
            Some(prev) => prev
                .into_iter()
                .filter(|r| branch_required.contains(r))
                .collect(),
        });

        for (key, value) in obj {
            match key.as_str() {
                "required" => {}
                "properties" => {
                    let props = merged
                        .entry("properties")
                        .or_insert_with(|| Value::Object(Map::new()));
                    if let (Value::Object(target), Value::Object(source)) = (props, value) {
                        for (name, schema) in source {
                            target.insert(name.clone(), schema.clone());
                        }
                    }
                }
                _ => match merged.get_mut(key) {
                    None => {
                        merged.insert(key.clone(), value.clone());
                    }
                    Some(existing) if existing == value => {}
                    Some(existing) => merge_value(key, existing, value),
                },
            }
        }
    }

    let mut required: Vec<String> = required_fields(base)
        .into_iter()
        .map(str::to_string)
        .collect();
    for r in intersection.unwrap_or_default() {
        if !required.contains(&r) {
            required.push(r);
        }
    }
    if required.is_empty() {
        merged.remove("required");
    } else {
        merged.insert(
            "required".to_string(),
            Value::Array(required.into_iter().map(Value::String).collect()),
        );
    }

    Value::Object(merged)
}

/// One `oneOf` alternative: the option's keys laid over the base schema.
pub fn merge_one_of(base: &Map<String, Value>, option: &Value) -> Value {
    let mut merged = base.clone();
    match option {
        Value::Object(obj) => {
            for (key, value) in obj {
                merged.insert(key.clone(), value.clone());
            }
            Value::Object(merged)
        }
        other if base.is_empty() => other.clone(),
        other => {
            merged.insert("type".to_string(), other.clone());
            Value::Object(merged)
        }
    }
}

/// Merge multiple Avro types into one.
///
/// Records are merged field by field; a field declared with different types
/// becomes a union of them, keeping the first `doc`. Enum symbols are unioned.
/// Names of merged types are concatenated unless `type_name` is given.
/// Anything else is combined into a flattened union.
pub fn merge_avro_types(
    types: Vec<AvroType>,
    type_name: Option<&str>,
    deps: &mut Vec<String>,
) -> AvroType {
    let mut types: Vec<AvroType> = types
        .into_iter()
        .filter(|t| !matches!(t, AvroType::Union(branches) if branches.is_empty()))
        .collect();

    match types.len() {
        0 => return AvroType::Union(Vec::new()),
        1 => return types.remove(0),
        _ => {}
    }

    if types.iter().all(|t| matches!(t, AvroType::Record(_))) {
        let records = types.into_iter().filter_map(|t| match t {
            AvroType::Record(r) => Some(r),
            _ => None,
        });
        return AvroType::Record(merge_records(records, type_name, deps));
    }

    if types.iter().all(|t| matches!(t, AvroType::Enum(_))) {
        let enums = types.into_iter().filter_map(|t| match t {
            AvroType::Enum(e) => Some(e),
            _ => None,
        });
        return AvroType::Enum(merge_enums(enums, type_name));
    }

    for t in &mut types {
        t.lift_dependencies(deps);
    }
    union_of(types)
}

fn merge_records(
    records: impl Iterator<Item = RecordType>,
    type_name: Option<&str>,
    deps: &mut Vec<String>,
) -> RecordType {
    let mut merged: Option<RecordType> = None;
    for mut record in records {
        deps.append(&mut record.dependencies);
        let Some(target) = merged.as_mut() else {
            merged = Some(record);
            continue;
        };
        if type_name.is_none() && target.name != record.name {
            target.name.push_str(&record.name);
        }
        if target.namespace.is_none() {
            target.namespace = record.namespace;
        }
        if target.doc.is_none() {
            target.doc = record.doc;
        }
        for field in record.fields {
            match target.fields.iter_mut().find(|f| f.name == field.name) {
                Some(existing) => {
                    if existing.field_type != field.field_type {
                        let placeholder = AvroType::Union(Vec::new());
                        let current = std::mem::replace(&mut existing.field_type, placeholder);
                        existing.field_type = AvroType::Union(flatten_union(vec![
                            current,
                            field.field_type,
                        ]));
                    }
                    if existing.doc.is_none() {
                        existing.doc = field.doc;
                    }
                }
                None => target.fields.push(field),
            }
        }
    }
    let mut merged = merged.unwrap_or_else(|| RecordType::new(type_name.unwrap_or_default(), ""));
    if let Some(name) = type_name {
        merged.name = name.to_string();
    }
    merged
}

fn merge_enums(enums: impl Iterator<Item = EnumType>, type_name: Option<&str>) -> EnumType {
    let mut merged: Option<EnumType> = None;
    for avro_enum in enums {
        let Some(target) = merged.as_mut() else {
            merged = Some(avro_enum);
            continue;
        };
        if type_name.is_none() && target.name != avro_enum.name {
            target.name.push_str(&avro_enum.name);
        }
        if target.doc.is_none() {
            target.doc = avro_enum.doc;
        }
        for symbol in avro_enum.symbols {
            if !target.symbols.contains(&symbol) {
                target.symbols.push(symbol);
            }
        }
    }
    let mut merged = merged.unwrap_or_else(|| EnumType {
        name: String::new(),
        namespace: None,
        doc: None,
        symbols: Vec::new(),
    });
    if let Some(name) = type_name {
        merged.name = name.to_string();
    }
    merged
}
