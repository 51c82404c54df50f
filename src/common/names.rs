use regex::Regex;
use std::sync::LazyLock;

static INVALID_NAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9_]").expect("valid regex"));
static INVALID_NAMESPACE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9_\.]").expect("valid regex"));

/// Replace every character outside `[A-Za-z0-9_]` with `_`.
pub fn sanitize_identifier(name: &str) -> String {
    INVALID_NAME_CHARS.replace_all(name, "_").into_owned()
}

/// Convert a raw string into a valid Avro name.
///
/// Ensures the identifier starts with a letter or underscore,
/// replaces invalid characters with `_`, and prefixes leading digits.
pub fn avro_name(name: &str) -> String {
    let val = sanitize_identifier(name);
    if val.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
        val
    } else {
        format!("_{val}")
    }
}

/// Convert an input string into a valid Avro namespace.
///
/// Replaces invalid chars with `_` but preserves dots as separators.
/// Prefixes with `_` if starting with a digit.
pub fn avro_namespace(name: &str) -> String {
    let val = INVALID_NAMESPACE_CHARS.replace_all(name, "_").into_owned();
    if val.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{val}")
    } else {
        val
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn avro_name_replaces_invalid_characters() {
        assert_eq!(avro_name("first name"), "first_name");
        assert_eq!(avro_name("a-b.c"), "a_b_c");
        assert_eq!(avro_name("valid_Name1"), "valid_Name1");
    }

    #[test]
    fn avro_name_prefixes_leading_digit_and_empty() {
        assert_eq!(avro_name("1st"), "_1st");
        assert_eq!(avro_name(""), "_");
    }

    #[test]
    fn avro_namespace_keeps_dots() {
        assert_eq!(avro_namespace("com.example-schemas"), "com.example_schemas");
        assert_eq!(avro_namespace("2024.events"), "_2024.events");
    }
}
