use std::borrow::Cow;

use serde_json::{Map, Value};

use crate::avro::{AvroField, AvroType, RecordType};
use crate::common::generic_type;
use crate::common::names::{avro_name, sanitize_identifier};
use crate::converter::analysis::{has_composition_keywords, required_fields, type_includes};
use crate::converter::composition::strip_unsupported;
use crate::converter::state::{JsonToAvroConverter, Scope};
use crate::error::{ConversionError, Result};

impl JsonToAvroConverter {
    /// Convert a JSON schema object declaration to an Avro record.
    ///
    /// `name` (or the schema's `title` when `name` is empty) names the record.
    /// Objects without `properties` collapse into a record holding a single
    /// `values` map or array; returns `Ok(None)` when there is nothing to hold.
    pub(crate) fn json_schema_object_to_avro_record(
        &mut self,
        name: &str,
        json_object: &Map<String, Value>,
        namespace: &str,
        scope: &Scope,
    ) -> Result<Option<AvroType>> {
        let json_object = match strip_unsupported(json_object) {
            Some(stripped) => Cow::Owned(stripped),
            None => Cow::Borrowed(json_object),
        };
        if has_composition_keywords(&json_object) {
            return self.composition_to_avro_record(name, &json_object, namespace, scope).map(Some);
        }

        let record_name = match (name, json_object.get("title").and_then(Value::as_str)) {
            (name, _) if !name.is_empty() => avro_name(name),
            (_, Some(title)) => avro_name(title),
            _ => {
                return Err(ConversionError::MissingRecordName(
                    Value::Object(json_object.clone().into_owned()).to_string(),
                ))
            }
        };

        // Break cycles with a containment record that refers back to the
        // record still being built.
        if let Some(in_progress) = self.record_stack.find(&record_name) {
            let mut wrapper = RecordType::new(&avro_name(&format!("{record_name}_ref")), namespace);
            wrapper.push_field(
                &record_name,
                AvroType::Reference(in_progress.qualified_name()),
            );
            return Ok(Some(AvroType::Record(wrapper)));
        }

        self.record_stack.push(&record_name, namespace);
        let built = self.build_record(&record_name, &json_object, namespace, scope);
        self.record_stack.pop();
        built
    }

    /// Top-level `allOf`/`oneOf`/`anyOf`: convert the composition as the type
    /// of a `value` field and make sure a record comes out of it.
    fn composition_to_avro_record(
        &mut self,
        name: &str,
        json_object: &Map<String, Value>,
        namespace: &str,
        scope: &Scope,
    ) -> Result<AvroType> {
        let mut dependencies = Vec::new();
        let record_scope = scope.for_record(name, namespace);
        let value_scope = record_scope.for_field("value");
        let node = Value::Object(json_object.clone());
        let converted = self.json_type_to_avro_type(&node, &value_scope, &mut dependencies)?;

        let mut record = match converted {
            Some(AvroType::Record(mut record)) => {
                record.name = avro_name(name);
                record.namespace = Some(namespace.to_string()).filter(|ns| !ns.is_empty());
                record
            }
            other => {
                let mut wrapper = RecordType::new(&avro_name(name), namespace);
                wrapper.push_field("value", other.unwrap_or_else(generic_type));
                wrapper
            }
        };
        if record.doc.is_none() {
            record.doc = description(json_object);
        }
        record.add_dependencies(dependencies);
        Ok(AvroType::Record(record))
    }

    fn build_record(
        &mut self,
        record_name: &str,
        json_object: &Map<String, Value>,
        namespace: &str,
        scope: &Scope,
    ) -> Result<Option<AvroType>> {
        let mut dependencies: Vec<String> = Vec::new();
        let mut avro_record = RecordType::new(record_name, namespace);
        let record_scope = scope.for_record(record_name, namespace);

        let properties = json_object
            .get("properties")
            .and_then(Value::as_object)
            .filter(|props| !props.is_empty());

        if let Some(properties) = properties {
            let required = required_fields(json_object);
            for (field_name, field) in properties {
                // skip fields with a bad type
                if !field.is_object() && !field.is_boolean() {
                    continue;
                }
                let field_scope = record_scope.for_field(field_name);
                let field_type = self
                    .json_type_to_avro_type(field, &field_scope, &mut dependencies)?
                    .unwrap_or_else(generic_type);
                let field_type = if required.contains(&field_name.as_str()) {
                    field_type
                } else {
                    make_nullable(field_type)
                };
                let mut avro_field = AvroField::new(&avro_name(field_name), field_type);
                avro_field.doc = field.as_object().and_then(description);
                avro_record.fields.push(avro_field);
            }

            if let Some(values_type) =
                self.handle_additional_properties(json_object, &record_scope, &mut dependencies)?
            {
                avro_record.push_field("additionalProperties", AvroType::map(values_type));
            }
            for (pattern_name, pattern_type) in
                self.handle_pattern_properties(json_object, &record_scope, &mut dependencies)?
            {
                avro_record.push_field(&pattern_name, AvroType::map(pattern_type));
            }
        } else {
            if let Some(values_type) =
                self.handle_additional_properties(json_object, &record_scope, &mut dependencies)?
            {
                avro_record.push_field("values", AvroType::map(values_type));
            }
            for (pattern_name, pattern_type) in
                self.handle_pattern_properties(json_object, &record_scope, &mut dependencies)?
            {
                avro_record.push_field(&pattern_name, AvroType::map(pattern_type));
            }

            if avro_record.fields.is_empty() {
                if type_includes(json_object, "object") || json_object.contains_key("properties") {
                    avro_record.push_field("values", AvroType::map(generic_type()));
                } else if type_includes(json_object, "array") {
                    let values_scope = record_scope.for_field("values");
                    let items = match json_object.get("items") {
                        Some(items) => self
                            .json_type_to_avro_type(items, &values_scope, &mut dependencies)?
                            .unwrap_or_else(generic_type),
                        None => generic_type(),
                    };
                    avro_record.push_field("values", AvroType::array(items));
                } else {
                    return Ok(None);
                }
            }
        }

        avro_record.doc = description(json_object);
        avro_record.add_dependencies(dependencies);
        Ok(Some(AvroType::Record(avro_record)))
    }

    /// Handle `additionalProperties` in a JSON Schema object.
    ///
    /// Only schema-valued `additionalProperties` produce a map value type.
    fn handle_additional_properties(
        &mut self,
        json_object: &Map<String, Value>,
        record_scope: &Scope,
        dependencies: &mut Vec<String>,
    ) -> Result<Option<AvroType>> {
        let Some(additional_props @ Value::Object(_)) = json_object.get("additionalProperties")
        else {
            return Ok(None);
        };
        let extensions_name = format!("{}_extensions", record_scope.record_name);
        let values_scope = record_scope.for_field(&extensions_name);
        let values_type = self
            .json_type_to_avro_type(additional_props, &values_scope, dependencies)?
            .filter(|t| !t.is_empty())
            .unwrap_or_else(generic_type);
        Ok(Some(values_type))
    }

    /// Handle `patternProperties` in a JSON Schema object.
    ///
    /// Returns one `(field name, map value type)` pair per pattern; the field
    /// name is the pattern with every character outside `[A-Za-z0-9_]`
    /// replaced by `_`.
    fn handle_pattern_properties(
        &mut self,
        json_object: &Map<String, Value>,
        record_scope: &Scope,
        dependencies: &mut Vec<String>,
    ) -> Result<Vec<(String, AvroType)>> {
        let Some(pattern_props) = json_object
            .get("patternProperties")
            .and_then(Value::as_object)
        else {
            return Ok(Vec::new());
        };
        let mut extension_types = Vec::with_capacity(pattern_props.len());
        for (pattern, prop_schema) in pattern_props {
            let mut pattern_name = sanitize_identifier(pattern);
            if pattern_name.is_empty() {
                pattern_name = "extensions".to_string();
            }
            let pattern_scope = record_scope.for_field(&pattern_name);
            let prop_type = self
                .json_type_to_avro_type(prop_schema, &pattern_scope, dependencies)?
                .filter(|t| !t.is_empty())
                .unwrap_or_else(generic_type);
            extension_types.push((avro_name(&pattern_name), prop_type));
        }
        Ok(extension_types)
    }
}

fn description(json_object: &Map<String, Value>) -> Option<String> {
    json_object
        .get("description")
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Widen an optional field's type with `null`, placed first.
fn make_nullable(field_type: AvroType) -> AvroType {
    if field_type.contains_null() {
        return field_type;
    }
    match field_type {
        AvroType::Union(mut branches) => {
            branches.insert(0, AvroType::null());
            AvroType::Union(branches)
        }
        other => AvroType::Union(vec![AvroType::null(), other]),
    }
}
