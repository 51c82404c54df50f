use crate::avro::{qualify, AvroType};
use crate::converter::registry::SchemaRegistry;
use crate::converter::source::{ContentSource, DefaultContentSource};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::rc::Rc;

/// Options for one JSON Schema → Avro conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOptions {
    /// Namespace override. Derived from `$id` or the input file name when absent.
    pub namespace: Option<String>,
    /// Name of the record generated for a single-schema document.
    pub root_class_name: String,
    /// Emit every top-level record as its own schema file.
    pub split_top_level_records: bool,
    /// Nesting depth past which the generic type is substituted.
    pub max_recursion_depth: usize,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            namespace: None,
            root_class_name: "document".to_string(),
            split_top_level_records: false,
            max_recursion_depth: 64,
        }
    }
}

/// What a resolved `$ref` stands for.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportedType {
    /// A named type registered under this qualified name.
    Named(String),
    /// A fragment that is not a standalone type, reused inline.
    Inline(AvroType),
}

/// `$ref` string → resolution result, for one conversion run.
///
/// Entries are registered before the referenced fragment is converted so that
/// circular reference chains end at a cache hit.
#[derive(Debug, Default)]
pub struct ImportCache {
    entries: HashMap<String, ImportedType>,
}

impl ImportCache {
    pub fn get(&self, reference: &str) -> Option<&ImportedType> {
        self.entries.get(reference)
    }

    pub fn insert_name(&mut self, reference: &str, qualified_name: String) {
        self.entries
            .insert(reference.to_string(), ImportedType::Named(qualified_name));
    }

    pub fn insert_inline(&mut self, reference: &str, avro_type: AvroType) {
        self.entries
            .insert(reference.to_string(), ImportedType::Inline(avro_type));
    }

    pub fn retract(&mut self, reference: &str) {
        self.entries.remove(reference);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StackEntry {
    pub name: String,
    pub namespace: String,
}

impl StackEntry {
    pub fn qualified_name(&self) -> String {
        qualify(Some(self.namespace.as_str()), &self.name)
    }
}

/// Records currently under construction, innermost last.
#[derive(Debug, Default)]
pub struct RecordStack {
    entries: Vec<StackEntry>,
}

impl RecordStack {
    pub fn find(&self, name: &str) -> Option<&StackEntry> {
        self.entries.iter().rev().find(|e| e.name == name)
    }

    pub fn push(&mut self, name: &str, namespace: &str) {
        self.entries.push(StackEntry {
            name: name.to_string(),
            namespace: namespace.to_string(),
        });
    }

    pub fn pop(&mut self) -> Option<StackEntry> {
        self.entries.pop()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Where in the input a fragment is being converted.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    /// Name of the enclosing record (or of the type being defined).
    pub record_name: &'a str,
    /// Field the fragment is the type of; empty for standalone types.
    pub field_name: &'a str,
    pub namespace: &'a str,
    /// Document that local `#/...` pointers resolve against.
    pub document: &'a Value,
    pub base_uri: &'a str,
    pub depth: usize,
}

impl<'a> Scope<'a> {
    pub fn root(
        record_name: &'a str,
        namespace: &'a str,
        document: &'a Value,
        base_uri: &'a str,
    ) -> Self {
        Self {
            record_name,
            field_name: "",
            namespace,
            document,
            base_uri,
            depth: 0,
        }
    }

    pub fn deeper(&self) -> Scope<'a> {
        Scope {
            depth: self.depth + 1,
            ..*self
        }
    }

    /// Scope for the type of `field_name` inside the current record.
    pub fn for_field<'b>(&'b self, field_name: &'b str) -> Scope<'b> {
        let base: Scope<'b> = *self;
        Scope {
            field_name,
            depth: self.depth + 1,
            ..base
        }
    }

    /// Scope for the fields of a record named `record_name`.
    pub fn for_record<'b>(&'b self, record_name: &'b str, namespace: &'b str) -> Scope<'b> {
        let base: Scope<'b> = *self;
        Scope {
            record_name,
            field_name: "",
            namespace,
            depth: self.depth + 1,
            ..base
        }
    }

    pub fn with_document<'b>(&'b self, document: &'b Value, base_uri: &'b str) -> Scope<'b> {
        let base: Scope<'b> = *self;
        Scope {
            document,
            base_uri,
            ..base
        }
    }

    /// Name for a type created at this scope: the field name, else the record name.
    pub fn local_name(&self) -> &'a str {
        if self.field_name.is_empty() {
            self.record_name
        } else {
            self.field_name
        }
    }

    /// Namespace for named types created at this scope. Types defined inline
    /// for a field live beneath their record: `<namespace>.<record>_types`.
    pub fn type_namespace(&self) -> String {
        if self.field_name.is_empty() {
            self.namespace.to_string()
        } else {
            crate::converter::utils::compose_namespace(&[
                self.namespace,
                &format!("{}_types", self.record_name),
            ])
        }
    }
}

/// Holds the state of one JSON Schema → Avro conversion.
///
/// The import cache, schema registry and record stack live exactly as long as
/// the converter, which serves a single conversion.
#[derive(Debug)]
pub struct JsonToAvroConverter {
    pub(crate) options: ConversionOptions,
    pub(crate) root_namespace: String,
    pub(crate) source: Box<dyn ContentSource>,
    pub(crate) imported_types: ImportCache,
    pub(crate) registry: SchemaRegistry,
    pub(crate) record_stack: RecordStack,
    pub(crate) documents: HashMap<String, Rc<Value>>,
}

impl JsonToAvroConverter {
    /// Create a converter that fetches remote references with [`DefaultContentSource`].
    pub fn new(root_namespace: &str, options: ConversionOptions) -> Self {
        Self::with_source(root_namespace, options, Box::new(DefaultContentSource::new()))
    }

    pub fn with_source(
        root_namespace: &str,
        options: ConversionOptions,
        source: Box<dyn ContentSource>,
    ) -> Self {
        Self {
            options,
            root_namespace: root_namespace.to_string(),
            source,
            imported_types: ImportCache::default(),
            registry: SchemaRegistry::default(),
            record_stack: RecordStack::default(),
            documents: HashMap::new(),
        }
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_stack_finds_innermost_entry() {
        let mut stack = RecordStack::default();
        stack.push("Node", "a");
        stack.push("Node", "b");
        assert_eq!(stack.find("Node").map(|e| e.qualified_name()), Some("b.Node".into()));
        stack.pop();
        stack.pop();
        assert!(stack.find("Node").is_none());
        assert!(stack.is_empty());
    }

    #[test]
    fn field_scope_nests_type_namespace() {
        let doc = json!({});
        let root = Scope::root("Person", "example", &doc, "file:///tmp/x.json");
        assert_eq!(root.type_namespace(), "example");
        assert_eq!(root.local_name(), "Person");

        let field = root.for_field("address");
        assert_eq!(field.type_namespace(), "example.Person_types");
        assert_eq!(field.local_name(), "address");
        assert_eq!(field.depth, 1);
    }
}
