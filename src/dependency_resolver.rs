use std::collections::HashSet;

use tracing::{debug, warn};

use crate::avro::AvroType;

fn dependencies_of(avro_type: &AvroType) -> &[String] {
    match avro_type {
        AvroType::Record(record) => &record.dependencies,
        _ => &[],
    }
}

/// Sort named types so every type comes after the types it depends on.
///
/// Repeated passes over the remaining types in registration order emit each
/// type whose dependencies have all been emitted. Dependencies on names that
/// aren't part of `avro_schema`, and on the type itself, don't hold a type
/// back. If a pass emits nothing, the earliest remaining type is emitted
/// anyway and the cycle is logged.
pub fn sort_messages_by_dependencies(avro_schema: Vec<AvroType>) -> Vec<AvroType> {
    let known: HashSet<String> = avro_schema
        .iter()
        .filter_map(AvroType::qualified_name)
        .collect();
    let mut remaining = avro_schema;
    let mut emitted: HashSet<String> = HashSet::new();
    let mut sorted_messages: Vec<AvroType> = Vec::with_capacity(remaining.len());

    while !remaining.is_empty() {
        let mut found = false;
        let mut i = 0;
        while i < remaining.len() {
            let own_name = remaining[i].qualified_name();
            let ready = dependencies_of(&remaining[i]).iter().all(|dep| {
                Some(dep) == own_name.as_ref() || !known.contains(dep) || emitted.contains(dep)
            });
            if ready {
                let record = remaining.remove(i);
                emitted.extend(own_name);
                sorted_messages.push(record);
                found = true;
                continue;
            }
            i += 1;
        }

        if !found {
            let record = remaining.remove(0);
            let name = record.qualified_name().unwrap_or_default();
            warn!("Circular dependencies remain unresolved at {name}");
            emitted.insert(name);
            sorted_messages.push(record);
        }
    }

    sorted_messages
}

/// Inline all named types `record` depends on into a copy of it.
///
/// Every reference to a type from `avro_schema` is replaced with its
/// definition the first time it occurs; later occurrences (and references back
/// to a type being defined) stay references.
pub fn inline_dependencies_of(record: &AvroType, avro_schema: &[AvroType]) -> AvroType {
    let mut inlined = record.clone();
    let mut defined: HashSet<String> = HashSet::new();
    inline_references(&mut inlined, avro_schema, &mut defined);
    inlined
}

fn inline_references(node: &mut AvroType, avro_schema: &[AvroType], defined: &mut HashSet<String>) {
    if let Some(qualified_name) = node.qualified_name() {
        if !defined.insert(qualified_name.clone()) {
            *node = AvroType::Reference(qualified_name);
            return;
        }
    }
    match node {
        AvroType::Reference(name) => {
            let name = name.clone();
            if defined.contains(&name) {
                return;
            }
            if let Some(definition) = avro_schema
                .iter()
                .find(|t| t.qualified_name().as_deref() == Some(name.as_str()))
            {
                *node = definition.clone();
                inline_references(node, avro_schema, defined);
            }
        }
        AvroType::Record(record) => {
            for field in &mut record.fields {
                inline_references(&mut field.field_type, avro_schema, defined);
            }
        }
        AvroType::Array(inner) | AvroType::Map(inner) => {
            inline_references(inner, avro_schema, defined);
        }
        AvroType::Union(branches) => {
            for branch in branches {
                inline_references(branch, avro_schema, defined);
            }
        }
        _ => {}
    }
}

/// Enforce Avro's define-once rule over an ordered list of named types.
///
/// A named type defined again (inline or at the top level) after its first
/// definition is replaced by a reference to its qualified name; repeated
/// top-level entries are dropped.
pub fn evict_duplicate_definitions(avro_schema: Vec<AvroType>) -> Vec<AvroType> {
    let mut defined: HashSet<String> = HashSet::new();
    let mut result = Vec::with_capacity(avro_schema.len());
    for mut avro_type in avro_schema {
        if let Some(name) = avro_type.qualified_name() {
            if defined.contains(&name) {
                debug!("Dropping repeated definition of {name}");
                continue;
            }
        }
        evict_nested(&mut avro_type, &mut defined);
        result.push(avro_type);
    }
    result
}

fn evict_nested(node: &mut AvroType, defined: &mut HashSet<String>) {
    if let Some(qualified_name) = node.qualified_name() {
        if !defined.insert(qualified_name.clone()) {
            *node = AvroType::Reference(qualified_name);
            return;
        }
    }
    match node {
        AvroType::Record(record) => {
            for field in &mut record.fields {
                evict_nested(&mut field.field_type, defined);
            }
        }
        AvroType::Array(inner) | AvroType::Map(inner) => evict_nested(inner, defined),
        AvroType::Union(branches) => {
            for branch in branches {
                evict_nested(branch, defined);
            }
        }
        _ => {}
    }
}
