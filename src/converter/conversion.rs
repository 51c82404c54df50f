use std::borrow::Cow;

use serde_json::{Map, Value};
use tracing::warn;

use crate::avro::{AvroType, EnumType};
use crate::common::generic_type;
use crate::common::names::avro_name;
use crate::converter::analysis::has_composition_keywords;
use crate::converter::composition::{expand_composition, strip_unsupported};
use crate::converter::state::{JsonToAvroConverter, Scope};
use crate::converter::types::json_schema_primitive_to_avro_type;
use crate::converter::unions::{flatten_union, union_of};
use crate::error::Result;

impl JsonToAvroConverter {
    /// Convert a JSON Schema node into an Avro type.
    ///
    /// Returns `Ok(None)` for nodes that carry no type information (`false`,
    /// or an object without `type`, `enum`, `items` or `format`); callers
    /// substitute the generic type where a type is required.
    pub(crate) fn json_type_to_avro_type(
        &mut self,
        json_type: &Value,
        scope: &Scope,
        dependencies: &mut Vec<String>,
    ) -> Result<Option<AvroType>> {
        if scope.depth > self.options.max_recursion_depth {
            warn!(
                "Maximum recursion depth {} exceeded in record {}, using generic type",
                self.options.max_recursion_depth, scope.record_name
            );
            return Ok(Some(generic_type()));
        }

        match json_type {
            Value::Bool(true) => Ok(Some(generic_type())),
            Value::Bool(false) => Ok(None),
            Value::String(_) | Value::Array(_) => Ok(Some(json_schema_primitive_to_avro_type(
                json_type,
                None,
                None,
                scope.local_name(),
                dependencies,
            ))),
            Value::Object(json_object) => {
                self.json_object_to_avro_type(json_object, scope, dependencies)
            }
            Value::Null | Value::Number(_) => {
                warn!("Unexpected schema value {json_type} in record {}", scope.record_name);
                Ok(Some(generic_type()))
            }
        }
    }

    fn json_object_to_avro_type(
        &mut self,
        json_object: &Map<String, Value>,
        scope: &Scope,
        dependencies: &mut Vec<String>,
    ) -> Result<Option<AvroType>> {
        let json_object = match strip_unsupported(json_object) {
            Some(stripped) => Cow::Owned(stripped),
            None => Cow::Borrowed(json_object),
        };

        if has_composition_keywords(&json_object) {
            let candidates = expand_composition(&json_object, scope.document);
            let keep_empty = json_object.contains_key("allOf");
            return self.convert_candidates(&candidates, keep_empty, scope, dependencies);
        }

        let untyped_object =
            json_object.contains_key("properties") && !json_object.contains_key("type");
        let json_object = if untyped_object {
            let mut typed = json_object.into_owned();
            typed.insert("type".to_string(), Value::String("object".to_string()));
            Cow::Owned(typed)
        } else {
            json_object
        };

        if json_object.contains_key("$ref") {
            return self.resolve_reference(&json_object, scope, dependencies);
        }

        let format = json_object.get("format").and_then(Value::as_str);
        let enum_values = json_object
            .get("enum")
            .and_then(Value::as_array)
            .map(Vec::as_slice);

        let avro_type = if let Some(constant) = json_object.get("const") {
            const_to_avro_type(constant, scope)
        } else {
            match json_object.get("type") {
                Some(Value::Array(types)) => {
                    match self.type_list_to_avro_type(types, &json_object, scope, dependencies)? {
                        Some(t) => t,
                        None => return Ok(None),
                    }
                }
                Some(Value::String(t)) if t == "array" => {
                    self.array_to_avro_type(&json_object, scope, dependencies)?
                }
                Some(Value::String(t)) if t == "object" => {
                    let record_namespace = scope.type_namespace();
                    match self.json_schema_object_to_avro_record(
                        scope.local_name(),
                        &json_object,
                        &record_namespace,
                        scope,
                    )? {
                        Some(mut record) => {
                            record.lift_dependencies(dependencies);
                            record
                        }
                        None => return Ok(None),
                    }
                }
                Some(json_primitive) => json_schema_primitive_to_avro_type(
                    json_primitive,
                    format,
                    enum_values,
                    scope.local_name(),
                    dependencies,
                ),
                None if enum_values.is_some() => json_schema_primitive_to_avro_type(
                    &Value::String("string".to_string()),
                    format,
                    enum_values,
                    scope.local_name(),
                    dependencies,
                ),
                None if json_object.contains_key("items") => {
                    self.array_to_avro_type(&json_object, scope, dependencies)?
                }
                None if format.is_some() => json_schema_primitive_to_avro_type(
                    &Value::String("string".to_string()),
                    format,
                    None,
                    scope.local_name(),
                    dependencies,
                ),
                None => return Ok(None),
            }
        };

        Ok(Some(self.finish_type(avro_type, &json_object, scope, dependencies)))
    }

    /// Convert the candidates a composition expanded into.
    ///
    /// A single candidate converts directly. Several candidates become a union
    /// of their (non-empty) conversions, each named `<local>_<n>` unless it is
    /// a reference.
    fn convert_candidates(
        &mut self,
        candidates: &[Value],
        keep_empty: bool,
        scope: &Scope,
        dependencies: &mut Vec<String>,
    ) -> Result<Option<AvroType>> {
        if let [single] = candidates {
            let converted = self.json_type_to_avro_type(single, &scope.deeper(), dependencies)?;
            return Ok(match converted {
                Some(t) if t.is_empty() && !keep_empty => Some(generic_type()),
                None if !keep_empty => Some(generic_type()),
                other => other,
            });
        }

        let local_name = scope.local_name();
        let mut subtypes: Vec<AvroType> = Vec::new();
        for (count, candidate) in candidates.iter().enumerate() {
            let is_reference = candidate
                .as_object()
                .is_some_and(|obj| obj.contains_key("$ref"));
            let sub_field_name = if is_reference {
                String::new()
            } else {
                avro_name(&format!("{local_name}_{}", count + 1))
            };
            let sub_scope = scope.for_field(&sub_field_name);
            let subtype = self.json_type_to_avro_type(candidate, &sub_scope, dependencies)?;
            if let Some(subtype) = subtype.filter(|t| !t.is_empty()) {
                subtypes.push(subtype);
            }
        }

        Ok(match subtypes.len() {
            0 => None,
            1 => subtypes.pop(),
            _ => Some(AvroType::Union(flatten_union(subtypes))),
        })
    }

    /// Convert a `type` list. Lists of primitives map to a union; a list that
    /// includes `object` or `array` converts each listed type as an alternative.
    fn type_list_to_avro_type(
        &mut self,
        types: &[Value],
        json_object: &Map<String, Value>,
        scope: &Scope,
        dependencies: &mut Vec<String>,
    ) -> Result<Option<AvroType>> {
        let is_structured = |t: &Value| matches!(t.as_str(), Some("object" | "array"));
        if !types.iter().any(is_structured) {
            let format = json_object.get("format").and_then(Value::as_str);
            let enum_values = json_object.get("enum").and_then(Value::as_array);
            return Ok(Some(json_schema_primitive_to_avro_type(
                &Value::Array(types.to_vec()),
                format,
                enum_values.map(Vec::as_slice),
                scope.local_name(),
                dependencies,
            )));
        }

        let with_type = |t: &Value| {
            let mut candidate = json_object.clone();
            candidate.insert("type".to_string(), t.clone());
            Value::Object(candidate)
        };
        let nullable = types.iter().any(|t| t.as_str() == Some("null"));
        let non_null: Vec<&Value> = types
            .iter()
            .filter(|t| t.as_str() != Some("null"))
            .collect();

        let converted = if let [single] = non_null.as_slice() {
            self.json_type_to_avro_type(&with_type(*single), &scope.deeper(), dependencies)?
        } else {
            let candidates: Vec<Value> = non_null.into_iter().map(with_type).collect();
            self.convert_candidates(&candidates, false, scope, dependencies)?
        };

        Ok(match converted {
            Some(t) if nullable => Some(union_of(vec![AvroType::null(), t])),
            other => other,
        })
    }

    /// Convert an array schema. Tuple `items` become an array of the union of
    /// the item types; missing `items` an array of the generic type.
    fn array_to_avro_type(
        &mut self,
        json_object: &Map<String, Value>,
        scope: &Scope,
        dependencies: &mut Vec<String>,
    ) -> Result<AvroType> {
        let item_scope = scope.deeper();
        let items = match json_object.get("items") {
            Some(Value::Array(tuple)) => {
                let mut item_types = Vec::new();
                for item in tuple {
                    if let Some(t) = self.json_type_to_avro_type(item, &item_scope, dependencies)? {
                        item_types.push(t);
                    }
                }
                if item_types.is_empty() {
                    generic_type()
                } else {
                    union_of(item_types)
                }
            }
            Some(items) => self
                .json_type_to_avro_type(items, &item_scope, dependencies)?
                .unwrap_or_else(generic_type),
            None => generic_type(),
        };
        Ok(AvroType::array(items))
    }

    /// Attach the node's description and namespace to named types, and turn a
    /// named type that is already registered into a reference to it.
    fn finish_type(
        &mut self,
        mut avro_type: AvroType,
        json_object: &Map<String, Value>,
        scope: &Scope,
        dependencies: &mut Vec<String>,
    ) -> AvroType {
        if let Some(description) = json_object.get("description").and_then(Value::as_str) {
            avro_type.set_doc_if_missing(description);
        }
        if !avro_type.is_named() {
            return avro_type;
        }
        if avro_type.namespace().is_none() {
            avro_type.set_namespace(&scope.type_namespace());
        }
        if matches!(avro_type, AvroType::Enum(_)) && scope.field_name.is_empty() {
            avro_type.set_name(&avro_name(scope.local_name()));
        }
        let existing = avro_type.name().and_then(|name| {
            self.registry
                .find(name, avro_type.namespace())
                .and_then(AvroType::qualified_name)
        });
        match existing {
            Some(qualified_name) => {
                if !dependencies.contains(&qualified_name) {
                    dependencies.push(qualified_name.clone());
                }
                AvroType::Reference(qualified_name)
            }
            None => avro_type,
        }
    }
}

/// A string constant is a single-symbol enum; other constants map to the
/// primitive of their JSON kind.
fn const_to_avro_type(constant: &Value, scope: &Scope) -> AvroType {
    match constant {
        Value::String(s) => AvroType::Enum(EnumType {
            name: avro_name(scope.local_name()),
            namespace: None,
            doc: None,
            symbols: vec![avro_name(s)],
        }),
        Value::Bool(_) => AvroType::primitive("boolean"),
        Value::Number(n) if n.is_f64() => AvroType::primitive("double"),
        Value::Number(n) if n.as_i64().is_some_and(|v| i32::try_from(v).is_ok()) => {
            AvroType::primitive("int")
        }
        Value::Number(_) => AvroType::primitive("long"),
        Value::Null => AvroType::null(),
        Value::Array(_) => AvroType::array(generic_type()),
        Value::Object(_) => AvroType::map(generic_type()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::state::ConversionOptions;
    use crate::converter::source::InMemorySource;
    use serde_json::json;

    fn converter() -> JsonToAvroConverter {
        JsonToAvroConverter::with_source(
            "test",
            ConversionOptions::default(),
            Box::new(InMemorySource::new()),
        )
    }

    fn convert(schema: Value) -> (Option<AvroType>, Vec<String>) {
        let mut conv = converter();
        let mut deps = Vec::new();
        let doc = schema.clone();
        let scope = Scope::root("Thing", "test", &doc, "file:///tmp/thing.json");
        let field_scope = scope.for_field("field");
        let t = conv.json_type_to_avro_type(&schema, &field_scope, &mut deps).unwrap();
        (t, deps)
    }

    fn convert_json(schema: Value) -> Value {
        convert(schema).0.unwrap().to_json()
    }

    #[test]
    fn boolean_schemas() {
        assert_eq!(convert(json!(true)).0, Some(generic_type()));
        assert_eq!(convert(json!(false)).0, None);
    }

    #[test]
    fn primitive_with_format() {
        assert_eq!(
            convert_json(json!({"type": "string", "format": "date"})),
            json!({"type": "int", "logicalType": "date"})
        );
    }

    #[test]
    fn string_const_becomes_single_symbol_enum() {
        assert_eq!(
            convert_json(json!({"const": "fixed-value"})),
            json!({"type": "enum", "name": "field", "namespace": "test.Thing_types", "symbols": ["fixed_value"]})
        );
        assert_eq!(convert_json(json!({"const": 3})), json!("int"));
        assert_eq!(convert_json(json!({"const": 3.5})), json!("double"));
    }

    #[test]
    fn enum_without_type_is_string_enum() {
        assert_eq!(
            convert_json(json!({"enum": ["a", "b"], "description": "letters"})),
            json!({
                "type": "enum",
                "name": "field_enum",
                "namespace": "test.Thing_types",
                "doc": "letters",
                "symbols": ["a", "b"]
            })
        );
    }

    #[test]
    fn nullable_type_list_with_object() {
        assert_eq!(
            convert_json(json!({
                "type": ["object", "null"],
                "properties": {"a": {"type": "string"}},
                "required": ["a"]
            })),
            json!(["null", {
                "type": "record",
                "name": "field",
                "namespace": "test.Thing_types",
                "fields": [{"name": "a", "type": "string"}]
            }])
        );
    }

    #[test]
    fn primitive_type_list_is_union() {
        assert_eq!(convert_json(json!({"type": ["string", "null"]})), json!(["string", "null"]));
    }

    #[test]
    fn arrays() {
        assert_eq!(
            convert_json(json!({"type": "array", "items": {"type": "integer"}})),
            json!({"type": "array", "items": "int"})
        );
        assert_eq!(
            convert_json(json!({"type": "array", "items": [{"type": "string"}, {"type": "boolean"}]})),
            json!({"type": "array", "items": ["string", "boolean"]})
        );
        assert_eq!(convert(json!({"type": "array"})).0, Some(AvroType::array(generic_type())));
    }

    #[test]
    fn untyped_schema_has_no_type() {
        assert_eq!(convert(json!({"description": "anything"})).0, None);
    }

    #[test]
    fn conditional_keywords_are_ignored() {
        assert_eq!(
            convert_json(json!({"type": "string", "if": {"minLength": 1}, "then": {}})),
            json!("string")
        );
    }

    #[test]
    fn one_of_primitives_is_union() {
        assert_eq!(
            convert_json(json!({"oneOf": [{"type": "string"}, {"type": "integer"}]})),
            json!(["string", "int"])
        );
    }

    #[test]
    fn recursion_limit_falls_back_to_generic() {
        let mut conv = JsonToAvroConverter::with_source(
            "test",
            ConversionOptions {
                max_recursion_depth: 2,
                ..ConversionOptions::default()
            },
            Box::new(InMemorySource::new()),
        );
        let schema = json!({"type": "array", "items": {"type": "array", "items": {"type": "array", "items": {"type": "string"}}}});
        let scope = Scope::root("Thing", "test", &schema, "file:///tmp/thing.json");
        let t = conv
            .json_type_to_avro_type(&schema, &scope, &mut Vec::new())
            .unwrap()
            .unwrap();
        assert_eq!(
            t,
            AvroType::array(AvroType::array(AvroType::array(generic_type())))
        );
    }
}
