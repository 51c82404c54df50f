#[cfg_attr(feature = "trace", crustrace::omni)]
mod innermod {
    use serde_json::{Map, Value};
    use tracing::{debug, warn};

    use crate::avro::{AvroType, RecordType};
    use crate::common::names::avro_name;
    use crate::converter::analysis::{
        has_composition_keywords, is_schema_like, is_standalone_fragment, type_includes,
    };
    use crate::converter::references::{escape_pointer_token, reference_key, type_name_from_pointer};
    use crate::converter::state::{ImportedType, JsonToAvroConverter, Scope};
    use crate::error::{ConversionError, Result};

    /// A single schema at the root of a document rather than a collection.
    fn is_single_schema(json_object: &Map<String, Value>) -> bool {
        json_object.contains_key("type")
            || json_object.contains_key("properties")
            || has_composition_keywords(json_object)
    }

    /// Detect the shape of a document and process every schema it holds.
    ///
    /// - a single schema becomes the root record named after `root_class_name`,
    /// - Swagger documents and `definitions`/`$defs` maps without a root `type`
    ///   have each definition processed by name,
    /// - arrays have each item processed, named by `title` or `<root>_<index>`.
    pub fn process_document(
        converter: &mut JsonToAvroConverter,
        json_schema: &Value,
        base_uri: &str,
    ) -> Result<()> {
        let root_class_name = converter.options.root_class_name.clone();
        match json_schema {
            Value::Object(obj) if is_single_schema(obj) => {
                process_definition(
                    converter,
                    json_schema,
                    base_uri,
                    &root_class_name,
                    json_schema,
                    None,
                )?;
            }
            Value::Object(obj)
                if obj.contains_key("swagger")
                    || obj.contains_key("definitions")
                    || obj.contains_key("$defs") =>
            {
                let container = if obj.contains_key("definitions") {
                    "definitions"
                } else {
                    "$defs"
                };
                let definitions = obj
                    .get(container)
                    .and_then(Value::as_object)
                    .filter(|defs| !defs.is_empty())
                    .ok_or_else(|| {
                        ConversionError::NoSchemaFound(format!("{base_uri} (no definitions)"))
                    })?;
                process_definition_list(
                    converter,
                    json_schema,
                    base_uri,
                    &format!("/{}", escape_pointer_token(container)),
                    definitions,
                )?;
            }
            Value::Array(items) => {
                for (index, item) in items.iter().enumerate() {
                    if !item.is_object() {
                        continue;
                    }
                    let name = item
                        .get("title")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("{root_class_name}_{index}"));
                    process_definition(converter, json_schema, base_uri, &name, item, None)?;
                }
            }
            _ => return Err(ConversionError::NoSchemaFound(base_uri.to_string())),
        }
        Ok(())
    }

    /// Process a schema definition list (e.g. `$defs` or `definitions`).
    ///
    /// Entries that aren't schemas themselves are treated as nested groups of
    /// definitions.
    pub fn process_definition_list(
        converter: &mut JsonToAvroConverter,
        json_schema: &Value,
        base_uri: &str,
        pointer: &str,
        json_schema_list: &Map<String, Value>,
    ) -> Result<()> {
        for (schema_name, schema) in json_schema_list {
            let schema_pointer = format!("{pointer}/{}", escape_pointer_token(schema_name));
            if is_schema_like(schema) {
                process_definition(
                    converter,
                    json_schema,
                    base_uri,
                    schema_name,
                    schema,
                    Some(schema_pointer.as_str()),
                )?;
            } else if let Some(group) = schema.as_object() {
                process_definition_list(converter, json_schema, base_uri, &schema_pointer, group)?;
            }
        }
        Ok(())
    }

    /// Process a single schema definition into Avro and register it.
    ///
    /// `pointer` locates the definition inside `json_schema`; definitions that
    /// were already imported through a `$ref` to that pointer are skipped.
    /// Returns the qualified name of the registered type.
    pub fn process_definition(
        converter: &mut JsonToAvroConverter,
        json_schema: &Value,
        base_uri: &str,
        schema_name: &str,
        schema: &Value,
        pointer: Option<&str>,
    ) -> Result<Option<String>> {
        let key = pointer.map(|p| reference_key(base_uri, &format!("#{p}")));
        if let Some(key) = &key {
            if let Some(ImportedType::Named(name)) = converter.imported_types.get(key) {
                debug!("{key} already imported as {name}");
                return Ok(None);
            }
        }

        let (name, namespace) = pointer
            .and_then(|p| type_name_from_pointer(&converter.root_namespace, p))
            .unwrap_or_else(|| (avro_name(schema_name), converter.root_namespace.clone()));
        let scope = Scope::root(&name, &namespace, json_schema, base_uri);

        let mut dependencies: Vec<String> = Vec::new();
        let converted = match schema.as_object() {
            Some(obj)
                if obj.contains_key("properties")
                    || type_includes(obj, "object")
                    || type_includes(obj, "array")
                    || has_composition_keywords(obj) =>
            {
                converter.json_schema_object_to_avro_record(&name, obj, &namespace, &scope)?
            }
            _ => converter.json_type_to_avro_type(schema, &scope, &mut dependencies)?,
        };

        let avro_type = match converted {
            Some(avro_type @ (AvroType::Record(_) | AvroType::Enum(_))) => avro_type,
            Some(AvroType::Reference(target)) if converter.registry().contains(&target) => {
                debug!("{name} is an alias of {target}");
                if let Some(key) = &key {
                    converter.imported_types.insert_name(key, target.clone());
                }
                return Ok(Some(target));
            }
            Some(other) => {
                let mut wrapper = RecordType::new(&name, &namespace);
                wrapper.push_field("value", other);
                wrapper.doc = schema
                    .get("description")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                AvroType::Record(wrapper)
            }
            None => {
                warn!("Definition {schema_name} has no usable type and is skipped");
                return Ok(None);
            }
        };

        let mut avro_type = avro_type;
        avro_type.set_name(&name);
        avro_type.set_namespace(&namespace);
        let qualified_name = converter.registry.register(avro_type, dependencies);
        // Only standalone fragments are imported by name; a `$ref` to anything
        // else resolves to the unwrapped type inline.
        if let Some(key) = key.as_ref().filter(|_| is_standalone_fragment(schema)) {
            converter.imported_types.insert_name(key, qualified_name.clone());
        }
        Ok(Some(qualified_name))
    }
}
pub use innermod::*;
