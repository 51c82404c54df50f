use serde::{Serialize, Serializer};
use serde_json::{json, Map, Value};

/// An Avro type as produced by the converter.
///
/// Named types (`Record`, `Enum`, `Fixed`) carry their own definitions; once a
/// named type has been registered, every other use of it is a `Reference` to
/// its qualified name.
#[derive(Debug, Clone, PartialEq)]
pub enum AvroType {
    /// One of the Avro primitives: `null`, `boolean`, `int`, `long`, `float`,
    /// `double`, `bytes`, `string`.
    Primitive(String),
    /// A (usually qualified) name pointing at a named type defined elsewhere.
    Reference(String),
    /// A primitive annotated with a logical type, e.g. `{"type": "int", "logicalType": "date"}`.
    Logical {
        base: String,
        logical_type: String,
    },
    Fixed(FixedType),
    Record(RecordType),
    Enum(EnumType),
    Array(Box<AvroType>),
    Map(Box<AvroType>),
    Union(Vec<AvroType>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordType {
    pub name: String,
    pub namespace: Option<String>,
    pub doc: Option<String>,
    pub fields: Vec<AvroField>,
    /// Qualified names of the named types this record's fields refer to.
    /// Consumed by the dependency sorter, never serialized.
    pub dependencies: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AvroField {
    pub name: String,
    pub field_type: AvroType,
    pub doc: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumType {
    pub name: String,
    pub namespace: Option<String>,
    pub doc: Option<String>,
    pub symbols: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FixedType {
    pub name: String,
    pub namespace: Option<String>,
    pub size: usize,
    pub logical_type: Option<String>,
}

/// Join a namespace and a name into an Avro full name.
pub fn qualify(namespace: Option<&str>, name: &str) -> String {
    match namespace {
        Some(ns) if !ns.is_empty() => format!("{ns}.{name}"),
        _ => name.to_string(),
    }
}

impl AvroType {
    pub fn primitive(name: &str) -> Self {
        AvroType::Primitive(name.to_string())
    }

    pub fn null() -> Self {
        AvroType::primitive("null")
    }

    pub fn logical(base: &str, logical_type: &str) -> Self {
        AvroType::Logical {
            base: base.to_string(),
            logical_type: logical_type.to_string(),
        }
    }

    pub fn array(items: AvroType) -> Self {
        AvroType::Array(Box::new(items))
    }

    pub fn map(values: AvroType) -> Self {
        AvroType::Map(Box::new(values))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, AvroType::Primitive(p) if p == "null")
    }

    /// True if this type is `null` or a union with a `null` branch.
    pub fn contains_null(&self) -> bool {
        match self {
            AvroType::Union(branches) => branches.iter().any(AvroType::is_null),
            other => other.is_null(),
        }
    }

    /// Records, enums and fixed types are the Avro named types.
    pub fn is_named(&self) -> bool {
        matches!(
            self,
            AvroType::Record(_) | AvroType::Enum(_) | AvroType::Fixed(_)
        )
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            AvroType::Record(r) => Some(r.name.as_str()),
            AvroType::Enum(e) => Some(e.name.as_str()),
            AvroType::Fixed(f) => Some(f.name.as_str()),
            _ => None,
        }
    }

    pub fn namespace(&self) -> Option<&str> {
        match self {
            AvroType::Record(r) => r.namespace.as_deref(),
            AvroType::Enum(e) => e.namespace.as_deref(),
            AvroType::Fixed(f) => f.namespace.as_deref(),
            _ => None,
        }
    }

    pub fn set_name(&mut self, name: &str) {
        match self {
            AvroType::Record(r) => r.name = name.to_string(),
            AvroType::Enum(e) => e.name = name.to_string(),
            AvroType::Fixed(f) => f.name = name.to_string(),
            _ => {}
        }
    }

    pub fn set_namespace(&mut self, namespace: &str) {
        let ns = Some(namespace.to_string());
        match self {
            AvroType::Record(r) => r.namespace = ns,
            AvroType::Enum(e) => e.namespace = ns,
            AvroType::Fixed(f) => f.namespace = ns,
            _ => {}
        }
    }

    /// Full name of a named type.
    pub fn qualified_name(&self) -> Option<String> {
        self.name().map(|name| qualify(self.namespace(), name))
    }

    /// An empty union, a record without fields or an enum without symbols
    /// carries no usable type information.
    pub fn is_empty(&self) -> bool {
        match self {
            AvroType::Union(branches) => branches.iter().all(AvroType::is_empty),
            AvroType::Record(r) => r.fields.is_empty(),
            AvroType::Enum(e) => e.symbols.is_empty(),
            _ => false,
        }
    }

    /// Set `doc` on records and enums that don't already carry one.
    pub fn set_doc_if_missing(&mut self, doc: &str) {
        let slot = match self {
            AvroType::Record(r) => &mut r.doc,
            AvroType::Enum(e) => &mut e.doc,
            _ => return,
        };
        if slot.is_none() {
            *slot = Some(doc.to_string());
        }
    }

    /// Move the dependency lists of inline records (at any depth) into `out`.
    pub fn lift_dependencies(&mut self, out: &mut Vec<String>) {
        match self {
            AvroType::Record(r) => {
                out.append(&mut r.dependencies);
                for field in &mut r.fields {
                    field.field_type.lift_dependencies(out);
                }
            }
            AvroType::Array(inner) | AvroType::Map(inner) => inner.lift_dependencies(out),
            AvroType::Union(branches) => {
                for branch in branches {
                    branch.lift_dependencies(out);
                }
            }
            _ => {}
        }
    }

    /// The Avro JSON representation. Keys keep the conventional Avro order.
    pub fn to_json(&self) -> Value {
        match self {
            AvroType::Primitive(name) | AvroType::Reference(name) => json!(name),
            AvroType::Logical { base, logical_type } => {
                json!({"type": base, "logicalType": logical_type})
            }
            AvroType::Fixed(fixed) => fixed.to_json(),
            AvroType::Record(record) => record.to_json(),
            AvroType::Enum(avro_enum) => avro_enum.to_json(),
            AvroType::Array(items) => json!({"type": "array", "items": items.to_json()}),
            AvroType::Map(values) => json!({"type": "map", "values": values.to_json()}),
            AvroType::Union(branches) => {
                Value::Array(branches.iter().map(AvroType::to_json).collect())
            }
        }
    }
}

impl RecordType {
    pub fn new(name: &str, namespace: &str) -> Self {
        Self {
            name: name.to_string(),
            namespace: Some(namespace.to_string()).filter(|ns| !ns.is_empty()),
            doc: None,
            fields: Vec::new(),
            dependencies: Vec::new(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&AvroField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn push_field(&mut self, name: &str, field_type: AvroType) {
        self.fields.push(AvroField::new(name, field_type));
    }

    /// Append dependencies, skipping ones already recorded.
    pub fn add_dependencies<I: IntoIterator<Item = String>>(&mut self, deps: I) {
        for dep in deps {
            if !self.dependencies.contains(&dep) {
                self.dependencies.push(dep);
            }
        }
    }
}

impl AvroField {
    pub fn new(name: &str, field_type: AvroType) -> Self {
        Self {
            name: name.to_string(),
            field_type,
            doc: None,
        }
    }
}

impl Serialize for AvroType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl RecordType {
    fn to_json(&self) -> Value {
        let mut map = Map::new();
        map.insert("type".into(), json!("record"));
        map.insert("name".into(), json!(self.name));
        insert_optional(&mut map, "namespace", &self.namespace);
        insert_optional(&mut map, "doc", &self.doc);
        let fields = self.fields.iter().map(AvroField::to_json).collect();
        map.insert("fields".into(), Value::Array(fields));
        Value::Object(map)
    }
}

impl AvroField {
    fn to_json(&self) -> Value {
        let mut map = Map::new();
        map.insert("name".into(), json!(self.name));
        map.insert("type".into(), self.field_type.to_json());
        insert_optional(&mut map, "doc", &self.doc);
        Value::Object(map)
    }
}

impl EnumType {
    fn to_json(&self) -> Value {
        let mut map = Map::new();
        map.insert("type".into(), json!("enum"));
        map.insert("name".into(), json!(self.name));
        insert_optional(&mut map, "namespace", &self.namespace);
        insert_optional(&mut map, "doc", &self.doc);
        map.insert("symbols".into(), json!(self.symbols));
        Value::Object(map)
    }
}

impl FixedType {
    fn to_json(&self) -> Value {
        let mut map = Map::new();
        map.insert("type".into(), json!("fixed"));
        map.insert("name".into(), json!(self.name));
        insert_optional(&mut map, "namespace", &self.namespace);
        map.insert("size".into(), json!(self.size));
        insert_optional(&mut map, "logicalType", &self.logical_type);
        Value::Object(map)
    }
}

fn insert_optional(map: &mut Map<String, Value>, key: &str, value: &Option<String>) {
    if let Some(value) = value {
        map.insert(key.to_string(), json!(value));
    }
}
