use crate::avro::{AvroType, EnumType, FixedType};
use crate::common::generic_type;
use crate::common::names::avro_name;
use serde_json::Value;

/// Convert a JSON Schema primitive into an Avro type.
///
/// Handles:
/// - `"string"`, `"integer"`, `"number"`, `"boolean"`, `"null"`
/// - JSON Schema `format` annotations (`int64`, `double`, `date-time`, `date`, `time`, `duration`, `uuid`)
/// - Enum → Avro enum named `<field>_enum`
/// - Lists of alternatives → union
///
/// Names that aren't JSON Schema primitives are treated as references to
/// named types defined elsewhere and recorded in `dependencies`.
pub fn json_schema_primitive_to_avro_type(
    json_primitive: &Value,
    format: Option<&str>,
    enum_values: Option<&[Value]>,
    field_name: &str,
    dependencies: &mut Vec<String>,
) -> AvroType {
    if let Value::Array(alternatives) = json_primitive {
        let mut union: Vec<AvroType> = Vec::new();
        for item in alternatives {
            let subtype = match item {
                Value::Object(obj) => {
                    let format2 = obj.get("format").and_then(Value::as_str);
                    let enum2 = obj.get("enum").and_then(Value::as_array);
                    let Some(item_type) = obj.get("type") else {
                        continue;
                    };
                    json_schema_primitive_to_avro_type(
                        item_type,
                        format2,
                        enum2.map(Vec::as_slice),
                        field_name,
                        dependencies,
                    )
                }
                other => json_schema_primitive_to_avro_type(
                    other,
                    format,
                    enum_values,
                    field_name,
                    dependencies,
                ),
            };
            match subtype {
                AvroType::Union(branches) => {
                    for branch in branches {
                        if !union.contains(&branch) {
                            union.push(branch);
                        }
                    }
                }
                single => {
                    if !union.contains(&single) {
                        union.push(single);
                    }
                }
            }
        }
        return if union.len() == 1 {
            union.remove(0)
        } else {
            AvroType::Union(union)
        };
    }

    let Some(primitive_str) = json_primitive.as_str() else {
        return generic_type();
    };

    let mut avro_type = match primitive_str {
        "string" => AvroType::primitive("string"),
        "integer" if format == Some("int64") => AvroType::primitive("long"),
        "integer" => AvroType::primitive("int"),
        "number" if format == Some("double") => AvroType::primitive("double"),
        "number" => AvroType::primitive("float"),
        "boolean" => AvroType::primitive("boolean"),
        "null" => return AvroType::null(),
        other => {
            if !dependencies.iter().any(|d| d == other) {
                dependencies.push(other.to_string());
            }
            AvroType::Reference(other.to_string())
        }
    };

    if let Some(fmt) = format {
        match fmt {
            "date-time" | "date" => avro_type = AvroType::logical("int", "date"),
            "time" => avro_type = AvroType::logical("int", "time-millis"),
            "duration" => {
                avro_type = AvroType::Fixed(FixedType {
                    name: avro_name(&format!("{field_name}_duration")),
                    namespace: None,
                    size: 12,
                    logical_type: Some("duration".to_string()),
                })
            }
            "uuid" => avro_type = AvroType::logical("string", "uuid"),
            _ => {}
        }
    }

    // Enum values override the primitive if any of them are strings
    if let Some(enum_vals) = enum_values {
        if enum_vals.iter().any(Value::is_string) {
            let symbols = enum_symbols(enum_vals);
            avro_type = if symbols.is_empty() {
                AvroType::primitive("string")
            } else {
                AvroType::Enum(EnumType {
                    name: avro_name(&format!("{field_name}_enum")),
                    namespace: None,
                    doc: None,
                    symbols,
                })
            };
        }
    }

    avro_type
}

/// Sanitize string enum values into Avro symbols, keeping the first
/// occurrence of each.
pub fn enum_symbols(enum_values: &[Value]) -> Vec<String> {
    let mut symbols: Vec<String> = Vec::new();
    for value in enum_values.iter().filter_map(Value::as_str) {
        if value.is_empty() {
            continue;
        }
        let symbol = avro_name(value);
        if !symbols.contains(&symbol) {
            symbols.push(symbol);
        }
    }
    symbols
}
