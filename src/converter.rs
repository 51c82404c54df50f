pub mod analysis;
pub mod composition;
pub mod conversion;
pub mod definitions;
pub mod merging;
pub mod records;
pub mod references;
pub mod registry;
pub mod source;
pub mod state;
pub mod types;
pub mod unions;
pub mod utils;

pub use registry::SchemaRegistry;
pub use source::{ContentSource, DefaultContentSource, InMemorySource};
pub use state::{ConversionOptions, JsonToAvroConverter};

use definitions::{process_definition, process_document};
use references::{fragment_to_pointer, type_name_from_pointer};
use utils::{basename_to_avro_namespace, id_to_avro_namespace, to_base_uri};

use serde_json::Value;
use std::fs;
use std::io;
use std::path::Path;
use tracing::info;
use url::Url;

use crate::avro::AvroType;
use crate::dependency_resolver::{
    evict_duplicate_definitions, inline_dependencies_of, sort_messages_by_dependencies,
};
use crate::error::{ConversionError, Result};

impl JsonToAvroConverter {
    /// Convert a parsed JSON Schema document into an Avro schema.
    ///
    /// `base_uri` locates the document (a path or URI) so that relative
    /// `$ref`s can be resolved. If it carries a `#/json/pointer` fragment,
    /// only the schema at that pointer is converted and returned as a single
    /// type with its dependencies inlined. Otherwise the result is a single
    /// named type, or a list of named types ordered so that every type comes
    /// after the types it refers to.
    ///
    /// The converter is consumed: its caches belong to one conversion.
    pub fn convert(mut self, json_schema: &Value, base_uri: &str) -> Result<Value> {
        let base_uri = if base_uri.is_empty() {
            String::new()
        } else {
            to_base_uri(base_uri)
        };
        let (document_uri, fragment) = match base_uri.split_once('#') {
            Some((document, fragment)) => (document.to_string(), Some(fragment)),
            None => (base_uri.clone(), None),
        };

        if let Some(fragment) = fragment.filter(|f| !f.is_empty()) {
            return self.convert_fragment(json_schema, &document_uri, fragment);
        }

        process_document(&mut self, json_schema, &document_uri)?;
        if self.registry.is_empty() {
            return Err(ConversionError::NoSchemaFound(document_uri));
        }

        let sorted = sort_messages_by_dependencies(self.registry.into_vec());
        let mut avro_schema = evict_duplicate_definitions(sorted);
        Ok(if avro_schema.len() == 1 {
            avro_schema.remove(0).to_json()
        } else {
            Value::Array(avro_schema.iter().map(AvroType::to_json).collect())
        })
    }

    fn convert_fragment(
        mut self,
        json_schema: &Value,
        document_uri: &str,
        fragment: &str,
    ) -> Result<Value> {
        let pointer = fragment_to_pointer(fragment);
        let schema = json_schema.pointer(&pointer).ok_or_else(|| {
            ConversionError::ReferenceResolution {
                reference: format!("#{fragment}"),
                base_uri: document_uri.to_string(),
            }
        })?;
        let schema_name = type_name_from_pointer(&self.root_namespace, &pointer)
            .map(|(name, _)| name)
            .unwrap_or_else(|| self.options.root_class_name.clone());

        let qualified_name = process_definition(
            &mut self,
            json_schema,
            document_uri,
            &schema_name,
            schema,
            Some(pointer.as_str()),
        )?
        .ok_or_else(|| ConversionError::NoSchemaFound(format!("{document_uri}#{fragment}")))?;

        let sorted = sort_messages_by_dependencies(self.registry.into_vec());
        let root = sorted
            .iter()
            .find(|t| t.qualified_name().as_deref() == Some(qualified_name.as_str()))
            .ok_or_else(|| ConversionError::NoSchemaFound(qualified_name.clone()))?;
        Ok(inline_dependencies_of(root, &sorted).to_json())
    }
}

/// Convert an in-memory JSON Schema into an Avro Schema with default options.
///
/// Returns either a single Avro schema object or a list of schemas.
pub fn jsons_to_avro(json_schema: &Value, namespace: &str, base_uri: &str) -> Result<Value> {
    JsonToAvroConverter::new(namespace, ConversionOptions::default()).convert(json_schema, base_uri)
}

/// Pick the namespace for a document: the explicit one if given, else one
/// derived from `$id`, else one derived from the document's file name.
pub fn derive_namespace(json_schema: &Value, location: &str, explicit: Option<&str>) -> String {
    if let Some(namespace) = explicit.filter(|ns| !ns.is_empty()) {
        return namespace.to_string();
    }
    json_schema
        .get("$id")
        .and_then(Value::as_str)
        .map(id_to_avro_namespace)
        .filter(|ns| !ns.is_empty())
        .unwrap_or_else(|| basename_to_avro_namespace(location))
}

/// Convert JSON Schema file into Avro Schema file(s).
///
/// This reads a JSON Schema file (from disk or HTTP), converts it to Avro,
/// and writes the `.avsc` file(s) to the given path.
///
/// # Arguments
/// * `json_schema_file_path` - Path or URL of the input JSON Schema, optionally with a `#/pointer` fragment.
/// * `avro_schema_path` - Path where the Avro schema file will be written; a
///   directory when `options.split_top_level_records` is set.
/// * `options` - Namespace override, root class name and output options.
///
/// # Returns
/// The converted Avro schema. Nothing is written unless conversion succeeds.
pub fn convert_jsons_to_avro(
    json_schema_file_path: &str,
    avro_schema_path: &str,
    options: ConversionOptions,
) -> Result<Value> {
    convert_jsons_to_avro_with_source(
        json_schema_file_path,
        avro_schema_path,
        options,
        Box::new(DefaultContentSource::new()),
    )
}

/// As [`convert_jsons_to_avro`], reading the input and every referenced
/// document through `source`.
pub fn convert_jsons_to_avro_with_source(
    json_schema_file_path: &str,
    avro_schema_path: &str,
    options: ConversionOptions,
    source: Box<dyn ContentSource>,
) -> Result<Value> {
    let base_uri = to_base_uri(json_schema_file_path);
    let mut document_url =
        Url::parse(&base_uri).map_err(|source| ConversionError::InvalidReference {
            reference: json_schema_file_path.to_string(),
            source,
        })?;
    document_url.set_fragment(None);

    let content = source.fetch(&document_url)?;
    let json_schema: Value =
        serde_json::from_str(&content).map_err(|source| ConversionError::InvalidJson {
            uri: document_url.to_string(),
            source,
        })?;

    let namespace = derive_namespace(
        &json_schema,
        json_schema_file_path,
        options.namespace.as_deref(),
    );
    info!("Converting {document_url} with namespace {namespace}");

    let split_top_level_records = options.split_top_level_records;
    let avro_schema = JsonToAvroConverter::with_source(&namespace, options, source)
        .convert(&json_schema, &base_uri)?;

    write_avro_schema(&avro_schema, Path::new(avro_schema_path), split_top_level_records)?;
    Ok(avro_schema)
}

/// Write the schema to `path`, or every top-level record to `<name>.avsc`
/// inside the directory `path` when splitting.
fn write_avro_schema(
    avro_schema: &Value,
    path: &Path,
    split_top_level_records: bool,
) -> Result<()> {
    let write = |file_path: &Path, value: &Value| -> Result<()> {
        let write_error = |source| ConversionError::Write {
            path: file_path.to_path_buf(),
            source,
        };
        let text = serde_json::to_string_pretty(value)
            .map_err(|e| write_error(io::Error::other(e)))?;
        fs::write(file_path, text).map_err(write_error)
    };

    if !split_top_level_records {
        return write(path, avro_schema);
    }

    fs::create_dir_all(path).map_err(|source| ConversionError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    let items = match avro_schema {
        Value::Array(items) => items.as_slice(),
        single => std::slice::from_ref(single),
    };
    for item in items {
        if item.get("type").and_then(Value::as_str) != Some("record") {
            continue;
        }
        if let Some(name) = item.get("name").and_then(Value::as_str) {
            let file_path = path.join(format!("{name}.avsc"));
            info!("Writing {}", file_path.display());
            write(&file_path, item)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn explicit_namespace_wins_over_id() {
        let schema = json!({"$id": "https://example.com/schemas/person.json"});
        assert_eq!(derive_namespace(&schema, "/tmp/person.json", Some("my.ns")), "my.ns");
        assert_eq!(
            derive_namespace(&schema, "/tmp/person.json", None),
            "com.example.person.schemas"
        );
        assert_eq!(derive_namespace(&json!({}), "/tmp/my-person.json", None), "my_person");
    }

    #[test]
    fn converts_single_schema_to_single_record() {
        let schema = json!({"type": "object", "properties": {"a": {"type": "string"}}, "required": ["a"]});
        let avro = jsons_to_avro(&schema, "ns", "").unwrap();
        assert_eq!(
            avro,
            json!({
                "type": "record",
                "name": "document",
                "namespace": "ns",
                "fields": [{"name": "a", "type": "string"}]
            })
        );
    }

    #[test]
    fn fragment_base_uri_selects_one_schema_with_inlined_dependencies() {
        let schema = json!({
            "definitions": {
                "Color": {"type": "string", "enum": ["RED", "BLUE"]},
                "Car": {
                    "type": "object",
                    "properties": {"color": {"$ref": "#/definitions/Color"}},
                    "required": ["color"]
                },
                "Unrelated": {"type": "object", "properties": {"x": {"type": "string"}}}
            }
        });
        let avro = jsons_to_avro(&schema, "ns", "file:///tmp/cars.json#/definitions/Car").unwrap();
        assert_eq!(
            avro,
            json!({
                "type": "record",
                "name": "Car",
                "namespace": "ns",
                "fields": [{
                    "name": "color",
                    "type": {"type": "enum", "name": "Color", "namespace": "ns", "symbols": ["RED", "BLUE"]}
                }]
            })
        );
    }

    #[test]
    fn missing_fragment_is_a_resolution_error() {
        let err = jsons_to_avro(&json!({}), "ns", "file:///tmp/x.json#/definitions/Nope").unwrap_err();
        assert!(matches!(err, ConversionError::ReferenceResolution { .. }));
    }

    #[test]
    fn writes_split_records() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let avro = json!([
            {"type": "enum", "name": "E", "symbols": ["A"]},
            {"type": "record", "name": "R", "fields": []}
        ]);
        write_avro_schema(&avro, &out, true).unwrap();
        assert!(out.join("R.avsc").exists());
        assert!(!out.join("E.avsc").exists());
    }
}
