use crate::avro::AvroType;

const SIMPLE_TYPES: [&str; 8] = [
    "null", "boolean", "int", "long", "float", "double", "bytes", "string",
];

fn simple_type_union() -> Vec<AvroType> {
    SIMPLE_TYPES.iter().map(|t| AvroType::primitive(t)).collect()
}

/// Construct the generic Avro type: a union of the simple types plus arrays and
/// maps nested two levels deep.
///
/// Stands in wherever a JSON Schema fragment admits any value.
pub fn generic_type() -> AvroType {
    let simple = simple_type_union();

    let mut l2 = simple.clone();
    l2.push(AvroType::array(AvroType::Union(simple.clone())));
    l2.push(AvroType::map(AvroType::Union(simple.clone())));

    let mut l1 = simple;
    l1.push(AvroType::array(AvroType::Union(l2.clone())));
    l1.push(AvroType::map(AvroType::Union(l2)));

    AvroType::Union(l1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generic_type_is_a_nullable_union_with_containers() {
        let AvroType::Union(branches) = generic_type() else {
            panic!("generic type must be a union");
        };
        assert_eq!(branches.len(), 10);
        assert!(branches[0].is_null());
        assert!(matches!(branches[8], AvroType::Array(_)));
        assert!(matches!(branches[9], AvroType::Map(_)));
    }
}
