use jsonschema2avro::converter::{
    convert_jsons_to_avro, jsons_to_avro, ConversionOptions, InMemorySource, JsonToAvroConverter,
};
use jsonschema2avro::error::{ConversionError, FetchError};
use serde_json::{json, Value};
use std::fs;
use tempfile::tempdir;

fn names(avro: &Value) -> Vec<String> {
    avro.as_array()
        .unwrap()
        .iter()
        .map(|t| format!("{}.{}", t["namespace"].as_str().unwrap(), t["name"].as_str().unwrap()))
        .collect()
}

fn field_type<'a>(record: &'a Value, name: &str) -> &'a Value {
    record["fields"]
        .as_array()
        .unwrap()
        .iter()
        .find(|f| f["name"] == name)
        .map(|f| &f["type"])
        .unwrap_or_else(|| panic!("no field {name} in {record}"))
}

#[test]
fn required_field_keeps_its_type() {
    let schema = json!({"type": "object", "properties": {"a": {"type": "string"}}, "required": ["a"]});
    let avro = jsons_to_avro(&schema, "ns", "").unwrap();
    assert_eq!(avro["type"], "record");
    assert_eq!(field_type(&avro, "a"), &json!("string"));
}

#[test]
fn optional_field_is_widened_with_leading_null() {
    let schema = json!({"type": "object", "properties": {"b": {"type": "integer"}}});
    let avro = jsons_to_avro(&schema, "ns", "").unwrap();
    assert_eq!(field_type(&avro, "b"), &json!(["null", "int"]));
}

#[test]
fn pattern_properties_become_map_fields() {
    let schema = json!({
        "type": "object",
        "properties": {"x": {"type": "string"}, "y": {"type": "string"}},
        "patternProperties": {"^ext-": {"type": "integer"}}
    });
    let avro = jsons_to_avro(&schema, "ns", "").unwrap();
    let field_names: Vec<&str> = avro["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["name"].as_str().unwrap())
        .collect();
    assert_eq!(field_names, vec!["x", "y", "_ext_"]);
    assert_eq!(field_type(&avro, "_ext_"), &json!({"type": "map", "values": "int"}));
}

#[test]
fn one_of_objects_stays_a_union_of_records() {
    let schema = json!({
        "oneOf": [
            {"type": "object", "properties": {"a": {"type": "string"}}},
            {"type": "object", "properties": {"b": {"type": "integer"}}}
        ]
    });
    let avro = jsons_to_avro(&schema, "ns", "").unwrap();
    assert_eq!(avro["name"], "document");
    let value = field_type(&avro, "value").as_array().unwrap();
    assert_eq!(value.len(), 2);
    assert!(value.iter().all(|t| t["type"] == "record"));
    assert_ne!(value[0]["name"], value[1]["name"]);
    assert_eq!(value[0]["fields"][0]["name"], "a");
    assert_eq!(value[1]["fields"][0]["name"], "b");
}

#[test]
fn self_reference_terminates_with_inline_ref_wrapper() {
    let schema = json!({
        "definitions": {
            "Node": {
                "type": "object",
                "properties": {"next": {"$ref": "#/definitions/Node"}}
            }
        }
    });
    let avro = jsons_to_avro(&schema, "ns", "file:///tmp/node.json").unwrap();
    assert_eq!(avro["name"], "Node");
    assert_eq!(
        field_type(&avro, "next"),
        &json!(["null", {
            "type": "record",
            "name": "Node_ref",
            "namespace": "ns",
            "fields": [{"name": "Node", "type": "ns.Node"}]
        }])
    );
}

#[test]
fn mutual_references_terminate() {
    let schema = json!({
        "definitions": {
            "Parent": {
                "type": "object",
                "properties": {
                    "children": {"type": "array", "items": {"$ref": "#/definitions/Child"}}
                }
            },
            "Child": {
                "type": "object",
                "properties": {"parent": {"$ref": "#/definitions/Parent"}}
            }
        }
    });
    let avro = jsons_to_avro(&schema, "ns", "file:///tmp/family.json").unwrap();
    assert_eq!(names(&avro), vec!["ns.Child", "ns.Parent"]);
    assert_eq!(
        field_type(&avro[1], "children"),
        &json!(["null", {"type": "array", "items": "ns.Child"}])
    );
    let parent = &field_type(&avro[0], "parent")[1];
    assert_eq!(parent["name"], "Parent_ref");
    assert_eq!(parent["fields"][0]["type"], "ns.Parent");
}

/// Definitions as an ordered object, so both key orders can be converted.
fn definitions(entries: &[(&str, Value)]) -> Value {
    let defs: serde_json::Map<String, Value> = entries
        .iter()
        .map(|(name, schema)| (name.to_string(), schema.clone()))
        .collect();
    json!({"definitions": defs})
}

#[test]
fn simple_definition_is_inlined_at_references_in_either_order() {
    let id = ("Id", json!({"type": "string", "format": "uuid"}));
    let account = (
        "Account",
        json!({
            "type": "object",
            "properties": {"id": {"$ref": "#/definitions/Id"}},
            "required": ["id"]
        }),
    );

    let id_first = definitions(&[id.clone(), account.clone()]);
    let id_last = definitions(&[account, id]);
    let field_types: Vec<Value> = [id_first, id_last]
        .iter()
        .map(|schema| {
            let avro = jsons_to_avro(schema, "ns", "file:///tmp/ids.json").unwrap();
            let account = avro
                .as_array()
                .unwrap()
                .iter()
                .find(|t| t["name"] == "Account")
                .unwrap()
                .clone();
            field_type(&account, "id").clone()
        })
        .collect();

    assert_eq!(field_types[0], json!({"type": "string", "logicalType": "uuid"}));
    assert_eq!(field_types[0], field_types[1]);
}

#[test]
fn alias_definition_resolves_to_the_aliased_record() {
    let schema = json!({
        "definitions": {
            "Person": {
                "type": "object",
                "properties": {"home": {"$ref": "#/definitions/Home"}}
            },
            "Home": {"$ref": "#/definitions/Address"},
            "Address": {
                "type": "object",
                "properties": {"street": {"type": "string"}},
                "required": ["street"]
            }
        }
    });
    let avro = jsons_to_avro(&schema, "ns", "file:///tmp/people.json").unwrap();
    assert_eq!(names(&avro), vec!["ns.Address", "ns.Person"]);
    assert_eq!(field_type(&avro[1], "home"), &json!(["null", "ns.Address"]));
}

#[test]
fn shared_reference_is_defined_once_and_precedes_its_users() {
    let schema = json!({
        "definitions": {
            "Person": {
                "type": "object",
                "properties": {
                    "home": {"$ref": "#/definitions/Address"},
                    "work": {"$ref": "#/definitions/Address"}
                },
                "required": ["home"]
            },
            "Address": {
                "type": "object",
                "properties": {"street": {"type": "string"}}
            }
        }
    });
    let avro = jsons_to_avro(&schema, "ns", "file:///tmp/people.json").unwrap();
    assert_eq!(names(&avro), vec!["ns.Address", "ns.Person"]);
    assert_eq!(field_type(&avro[1], "home"), &json!("ns.Address"));
    assert_eq!(field_type(&avro[1], "work"), &json!(["null", "ns.Address"]));
}

#[test]
fn enum_symbols_are_deduplicated_in_order() {
    let schema = json!({
        "type": "object",
        "properties": {"e": {"enum": ["A", "B", "A", "c-d"]}},
        "required": ["e"]
    });
    let avro = jsons_to_avro(&schema, "ns", "").unwrap();
    assert_eq!(field_type(&avro, "e")["symbols"], json!(["A", "B", "c_d"]));
}

#[test]
fn all_of_merges_into_one_record() {
    let schema = json!({
        "definitions": {
            "Named": {"type": "object", "properties": {"name": {"type": "string"}}, "required": ["name"]}
        },
        "type": "object",
        "allOf": [
            {"$ref": "#/definitions/Named"},
            {"properties": {"age": {"type": "integer"}}}
        ]
    });
    let avro = jsons_to_avro(&schema, "ns", "file:///tmp/merged.json").unwrap();
    assert_eq!(avro["name"], "document");
    assert_eq!(field_type(&avro, "name"), &json!("string"));
    assert_eq!(field_type(&avro, "age"), &json!(["null", "int"]));
}

#[test]
fn any_of_requires_only_common_fields() {
    let schema = json!({
        "type": "object",
        "properties": {"id": {"type": "string"}},
        "required": ["id"],
        "anyOf": [
            {"properties": {"a": {"type": "string"}, "b": {"type": "string"}}, "required": ["a", "b"]},
            {"properties": {"a": {"type": "string"}}, "required": ["a"]}
        ]
    });
    let avro = jsons_to_avro(&schema, "ns", "").unwrap();
    assert_eq!(field_type(&avro, "id"), &json!("string"));
    assert_eq!(field_type(&avro, "a"), &json!("string"));
    assert_eq!(field_type(&avro, "b"), &json!(["null", "string"]));
}

#[test]
fn remote_references_resolve_relative_to_their_document() {
    let source = InMemorySource::new()
        .with_document(
            "https://example.com/schemas/address.json",
            r##"{
                "type": "object",
                "properties": {
                    "street": {"type": "string"},
                    "country": {"$ref": "common/country.json#/definitions/Country"}
                },
                "required": ["street", "country"]
            }"##,
        )
        .with_document(
            "https://example.com/schemas/common/country.json",
            r#"{"definitions": {"Country": {"type": "string", "enum": ["NL", "DE"]}}}"#,
        );
    let schema = json!({
        "type": "object",
        "properties": {"address": {"$ref": "address.json"}},
        "required": ["address"]
    });
    let avro = JsonToAvroConverter::with_source("ns", ConversionOptions::default(), Box::new(source))
        .convert(&schema, "https://example.com/schemas/person.json")
        .unwrap();

    assert_eq!(names(&avro), vec!["ns.Country", "ns.address", "ns.document"]);
    assert_eq!(avro[0]["symbols"], json!(["NL", "DE"]));
    assert_eq!(field_type(&avro[1], "country"), &json!("ns.Country"));
    assert_eq!(field_type(&avro[2], "address"), &json!("ns.address"));
}

#[test]
fn missing_remote_document_is_an_error() {
    let schema = json!({"type": "object", "properties": {"a": {"$ref": "missing.json"}}});
    let err = JsonToAvroConverter::with_source(
        "ns",
        ConversionOptions::default(),
        Box::new(InMemorySource::new()),
    )
    .convert(&schema, "https://example.com/schemas/root.json")
    .unwrap_err();
    assert!(matches!(err, ConversionError::Fetch(FetchError::NotFound(_))));
}

#[test]
fn unresolvable_local_pointer_is_an_error() {
    let schema = json!({"type": "object", "properties": {"a": {"$ref": "#/definitions/Nope"}}});
    let err = jsons_to_avro(&schema, "ns", "file:///tmp/broken.json").unwrap_err();
    assert!(matches!(err, ConversionError::ReferenceResolution { .. }));
}

#[test]
fn file_references_are_read_from_disk() {
    let dir = tempdir().unwrap();
    let main = dir.path().join("main.json");
    let out = dir.path().join("main.avsc");
    fs::write(
        dir.path().join("defs.json"),
        r#"{"definitions": {"Id": {"type": "string", "format": "uuid"}}}"#,
    )
    .unwrap();
    fs::write(
        &main,
        r##"{
            "type": "object",
            "properties": {"id": {"$ref": "defs.json#/definitions/Id"}},
            "required": ["id"]
        }"##,
    )
    .unwrap();

    let avro = convert_jsons_to_avro(main.to_str().unwrap(), out.to_str().unwrap(), ConversionOptions::default())
        .unwrap();
    assert_eq!(avro["namespace"], "main");
    assert_eq!(field_type(&avro, "id"), &json!({"type": "string", "logicalType": "uuid"}));

    let written: Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(written, avro);
}

#[test]
fn failed_conversion_writes_nothing() {
    let dir = tempdir().unwrap();
    let main = dir.path().join("main.json");
    let out = dir.path().join("main.avsc");
    fs::write(&main, r#"{"type": "object", "properties": {"a": {"$ref": "gone.json"}}}"#).unwrap();

    let err = convert_jsons_to_avro(main.to_str().unwrap(), out.to_str().unwrap(), ConversionOptions::default())
        .unwrap_err();
    assert!(matches!(err, ConversionError::Fetch(FetchError::File { .. })));
    assert!(!out.exists());
}

#[test]
fn invalid_json_input_is_reported() {
    let dir = tempdir().unwrap();
    let main = dir.path().join("main.json");
    fs::write(&main, "{ not json").unwrap();
    let err = convert_jsons_to_avro(
        main.to_str().unwrap(),
        dir.path().join("out.avsc").to_str().unwrap(),
        ConversionOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, ConversionError::InvalidJson { .. }));
}

#[test]
fn id_supplies_the_namespace() {
    let dir = tempdir().unwrap();
    let main = dir.path().join("order.json");
    fs::write(
        &main,
        r#"{"$id": "https://schemas.example.com/events/order.json", "type": "object", "properties": {}}"#,
    )
    .unwrap();
    let avro = convert_jsons_to_avro(
        main.to_str().unwrap(),
        dir.path().join("order.avsc").to_str().unwrap(),
        ConversionOptions::default(),
    )
    .unwrap();
    assert_eq!(avro["namespace"], "com.example.schemas.order.events");
    assert_eq!(avro["fields"][0]["name"], "values");
}

#[test]
fn deep_nesting_falls_back_to_generic_type() {
    let mut schema = json!({"type": "string"});
    for _ in 0..10 {
        schema = json!({"type": "array", "items": schema});
    }
    let root = json!({"type": "object", "properties": {"deep": schema}, "required": ["deep"]});
    let options = ConversionOptions {
        max_recursion_depth: 4,
        ..ConversionOptions::default()
    };
    let avro = JsonToAvroConverter::new("ns", options).convert(&root, "").unwrap();

    let mut node = field_type(&avro, "deep");
    let mut arrays = 0;
    while node["type"] == "array" {
        node = &node["items"];
        arrays += 1;
    }
    assert!(arrays < 10);
    assert!(node.is_array(), "expected the generic union, got {node}");
}

#[test]
fn schema_arrays_produce_one_type_per_item() {
    let schema = json!([
        {"title": "Cat", "type": "object", "properties": {"meow": {"type": "boolean"}}},
        {"type": "object", "properties": {"bark": {"type": "boolean"}}}
    ]);
    let avro = jsons_to_avro(&schema, "pets", "").unwrap();
    assert_eq!(names(&avro), vec!["pets.Cat", "pets.document_1"]);
}
