use crate::avro::AvroType;
use crate::converter::merging::merge_avro_types;

/// Flatten a union type into a simplified list of unique types.
///
/// This will:
/// - Recursively expand nested unions (Avro forbids unions of unions),
/// - Remove duplicates,
/// - Merge multiple `array` or `map` definitions into one.
pub fn flatten_union(type_list: Vec<AvroType>) -> Vec<AvroType> {
    let mut flat_list: Vec<AvroType> = Vec::new();
    for t in type_list {
        expand_into(&mut flat_list, t);
    }

    // Consolidate array/map definitions
    let mut array_at: Option<usize> = None;
    let mut map_at: Option<usize> = None;
    let mut consolidated: Vec<AvroType> = Vec::with_capacity(flat_list.len());

    for t in flat_list {
        match t {
            AvroType::Array(items) => match array_at {
                Some(i) => {
                    if let AvroType::Array(existing) = &mut consolidated[i] {
                        merge_container_type(existing, *items);
                    }
                }
                None => {
                    array_at = Some(consolidated.len());
                    consolidated.push(AvroType::Array(items));
                }
            },
            AvroType::Map(values) => match map_at {
                Some(i) => {
                    if let AvroType::Map(existing) = &mut consolidated[i] {
                        merge_container_type(existing, *values);
                    }
                }
                None => {
                    map_at = Some(consolidated.len());
                    consolidated.push(AvroType::Map(values));
                }
            },
            other => consolidated.push(other),
        }
    }

    consolidated
}

/// Build a union from `types`, collapsing it to the single member if only one is left.
pub fn union_of(types: Vec<AvroType>) -> AvroType {
    let mut flat = flatten_union(types);
    if flat.len() == 1 {
        flat.remove(0)
    } else {
        AvroType::Union(flat)
    }
}

fn expand_into(flat_list: &mut Vec<AvroType>, t: AvroType) {
    match t {
        AvroType::Union(branches) => {
            for branch in branches {
                expand_into(flat_list, branch);
            }
        }
        other => {
            if !flat_list.contains(&other) {
                flat_list.push(other);
            }
        }
    }
}

fn merge_container_type(existing: &mut Box<AvroType>, incoming: AvroType) {
    if **existing == incoming {
        return;
    }
    let current = std::mem::replace(existing.as_mut(), AvroType::Union(Vec::new()));
    let same_kind = matches!(
        (&current, &incoming),
        (AvroType::Record(_), AvroType::Record(_)) | (AvroType::Enum(_), AvroType::Enum(_))
    );
    **existing = if same_kind {
        // item records merge field by field; their dependencies stay on the result
        let mut deps = Vec::new();
        let mut merged = merge_avro_types(vec![current, incoming], None, &mut deps);
        if let AvroType::Record(record) = &mut merged {
            record.add_dependencies(deps);
        }
        merged
    } else {
        union_of(vec![current, incoming])
    };
}
