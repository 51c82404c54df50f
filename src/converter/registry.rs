use tracing::debug;

use crate::avro::AvroType;

/// The named Avro types emitted during one conversion, in registration order.
///
/// A `(name, namespace)` pair is registered at most once.
#[derive(Debug, Default, Clone)]
pub struct SchemaRegistry {
    types: Vec<AvroType>,
}

impl SchemaRegistry {
    /// Look up a registered type by name and namespace.
    pub fn find(&self, name: &str, namespace: Option<&str>) -> Option<&AvroType> {
        let namespace = namespace.filter(|ns| !ns.is_empty());
        self.types.iter().find(|t| {
            t.name() == Some(name) && t.namespace().filter(|ns| !ns.is_empty()) == namespace
        })
    }

    pub fn find_qualified(&self, qualified_name: &str) -> Option<&AvroType> {
        self.types
            .iter()
            .find(|t| t.qualified_name().as_deref() == Some(qualified_name))
    }

    pub fn contains(&self, qualified_name: &str) -> bool {
        self.find_qualified(qualified_name).is_some()
    }

    /// Register a named type with the dependencies collected while building it.
    ///
    /// Dependencies of inline records nested in the type are lifted onto it.
    /// If a type of the same name and namespace is already registered, the new
    /// definition is dropped. Returns the qualified name either way.
    pub fn register(&mut self, mut avro_type: AvroType, dependencies: Vec<String>) -> String {
        let qualified_name = avro_type.qualified_name().unwrap_or_default();
        if self.contains(&qualified_name) {
            debug!("{qualified_name} already registered");
            return qualified_name;
        }
        if let AvroType::Record(record) = &mut avro_type {
            let mut nested = Vec::new();
            for field in &mut record.fields {
                field.field_type.lift_dependencies(&mut nested);
            }
            record.add_dependencies(
                dependencies
                    .into_iter()
                    .chain(nested)
                    .filter(|d| d != &qualified_name),
            );
            record.dependencies.retain(|d| d != &qualified_name);
        }
        debug!("Registering {qualified_name}");
        self.types.push(avro_type);
        qualified_name
    }

    pub fn iter(&self) -> impl Iterator<Item = &AvroType> {
        self.types.iter()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn into_vec(self) -> Vec<AvroType> {
        self.types
    }
}
