use percent_encoding::percent_decode_str;
use serde_json::{Map, Value};
use std::rc::Rc;
use tracing::{debug, warn};
use url::Url;

use crate::avro::AvroType;
use crate::common::generic_type;
use crate::common::names::avro_name;
use crate::converter::analysis::{is_bare_reference, is_standalone_fragment};
use crate::converter::merging::merge_json_schemas;
use crate::converter::state::{ImportedType, JsonToAvroConverter, Scope};
use crate::converter::utils::{compose_namespace, file_stem};
use crate::error::{ConversionError, Result};

/// Pointer containers that don't contribute to a type's namespace.
const DEFINITION_CONTAINERS: [&str; 2] = ["definitions", "$defs"];

/// Normalise a URI fragment into an RFC 6901 JSON Pointer.
///
/// Percent-escapes are decoded and sloppy fragments such as
/// `definitions/X` gain their leading `/`.
pub fn fragment_to_pointer(fragment: &str) -> String {
    let decoded = percent_decode_str(fragment).decode_utf8_lossy();
    if decoded.is_empty() || decoded.starts_with('/') {
        decoded.into_owned()
    } else {
        format!("/{decoded}")
    }
}

/// Resolve a document-local `#...` reference against `document`.
pub fn local_fragment<'a>(document: &'a Value, reference: &str) -> Option<&'a Value> {
    let fragment = reference.strip_prefix('#')?;
    document.pointer(&fragment_to_pointer(fragment))
}

/// Key under which a `$ref` is cached: the reference made absolute against
/// the base URI when there is one.
pub fn reference_key(base_uri: &str, reference: &str) -> String {
    Url::parse(base_uri)
        .and_then(|base| base.join(reference))
        .map(String::from)
        .unwrap_or_else(|_| reference.to_string())
}

/// Unescape one JSON Pointer token.
fn pointer_token(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}

/// Escape a name for use as one JSON Pointer token.
pub fn escape_pointer_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

/// Name and namespace of the type a JSON Pointer addresses.
///
/// The last token is the name; the namespace is `root_namespace` followed by
/// the intermediate tokens, minus `definitions`/`$defs` containers. Returns
/// `None` for the empty (whole-document) pointer.
pub fn type_name_from_pointer(root_namespace: &str, pointer: &str) -> Option<(String, String)> {
    let segments: Vec<String> = pointer
        .split('/')
        .skip(1)
        .map(pointer_token)
        .collect();
    let (last, intermediate) = segments.split_last()?;
    let parts: Vec<&str> = std::iter::once(root_namespace)
        .chain(
            intermediate
                .iter()
                .map(String::as_str)
                .filter(|s| !DEFINITION_CONTAINERS.contains(s)),
        )
        .collect();
    Some((avro_name(last), compose_namespace(&parts)))
}

/// A referenced fragment together with the document it was found in.
struct Located {
    fragment: Value,
    /// Set when the fragment lives in another document.
    document: Option<Rc<Value>>,
    base_uri: String,
    url: Option<Url>,
}

impl JsonToAvroConverter {
    /// Resolve the `$ref` of `json_object` into an Avro type.
    ///
    /// Standalone fragments are registered as named types and returned as a
    /// reference to their qualified name, which is also pushed onto
    /// `dependencies`. The import cache entry for a standalone fragment is set
    /// before the fragment is converted, so circular chains end at a cache hit.
    pub(crate) fn resolve_reference(
        &mut self,
        json_object: &Map<String, Value>,
        scope: &Scope,
        dependencies: &mut Vec<String>,
    ) -> Result<Option<AvroType>> {
        let Some(reference) = json_object.get("$ref").and_then(Value::as_str) else {
            warn!("Ignoring non-string $ref in record {}", scope.record_name);
            return Ok(Some(generic_type()));
        };
        let key = reference_key(scope.base_uri, reference);

        if let Some(cached) = self.imported_types.get(&key) {
            return Ok(Some(match cached {
                ImportedType::Named(name) => {
                    if !dependencies.contains(name) {
                        dependencies.push(name.clone());
                    }
                    AvroType::Reference(name.clone())
                }
                ImportedType::Inline(avro_type) => avro_type.clone(),
            }));
        }

        let located = self.locate(reference, scope)?;
        let document = located.document.as_deref().unwrap_or(scope.document);

        if !is_bare_reference(json_object) {
            // Sibling keys refine the referenced fragment, so the combination is
            // converted inline and never cached.
            let mut siblings = json_object.clone();
            siblings.remove("$ref");
            let merged = merge_json_schemas(&[Value::Object(siblings), located.fragment]);
            let inner = scope.with_document(document, &located.base_uri).deeper();
            return self.json_type_to_avro_type(&merged, &inner, dependencies);
        }

        let (type_name, type_namespace) =
            self.name_from_reference(reference, located.url.as_ref(), scope);
        let expected = crate::avro::qualify(Some(type_namespace.as_str()), &type_name);
        let standalone = is_standalone_fragment(&located.fragment);
        if standalone {
            self.imported_types.insert_name(&key, expected.clone());
        }
        debug!("Resolving {key} as {expected}");

        let mut deps: Vec<String> = Vec::new();
        let inner = Scope {
            record_name: &type_name,
            field_name: "",
            namespace: &type_namespace,
            document,
            base_uri: &located.base_uri,
            depth: scope.depth + 1,
        };
        let resolved = self.json_type_to_avro_type(&located.fragment, &inner, &mut deps)?;

        match resolved {
            Some(avro_type @ (AvroType::Record(_) | AvroType::Enum(_)))
                if avro_type.qualified_name().as_ref() != Some(&expected) =>
            {
                // A cycle wrapper stands in for the type still being built. It
                // is defined at its use so it never precedes that type.
                self.imported_types.retract(&key);
                merge_dependencies(dependencies, deps);
                Ok(Some(avro_type))
            }
            Some(avro_type @ (AvroType::Record(_) | AvroType::Enum(_))) => {
                let qualified = self.registry.register(avro_type, deps);
                self.imported_types.insert_name(&key, qualified.clone());
                if !dependencies.contains(&qualified) {
                    dependencies.push(qualified.clone());
                }
                Ok(Some(AvroType::Reference(qualified)))
            }
            Some(AvroType::Reference(name)) => {
                self.imported_types.insert_name(&key, name.clone());
                merge_dependencies(dependencies, deps);
                Ok(Some(AvroType::Reference(name)))
            }
            Some(avro_type) => {
                self.imported_types.insert_inline(&key, avro_type.clone());
                merge_dependencies(dependencies, deps);
                Ok(Some(avro_type))
            }
            None => {
                self.imported_types.retract(&key);
                warn!(
                    "No usable type definition for {reference} in record {}, using generic type",
                    scope.record_name
                );
                Ok(Some(generic_type()))
            }
        }
    }

    /// Find the fragment a reference points at, fetching other documents as needed.
    fn locate(&mut self, reference: &str, scope: &Scope) -> Result<Located> {
        if reference.starts_with('#') {
            let fragment = local_fragment(scope.document, reference)
                .cloned()
                .ok_or_else(|| ConversionError::ReferenceResolution {
                    reference: reference.to_string(),
                    base_uri: scope.base_uri.to_string(),
                })?;
            return Ok(Located {
                fragment,
                document: None,
                base_uri: scope.base_uri.to_string(),
                url: None,
            });
        }

        let invalid = |source| ConversionError::InvalidReference {
            reference: reference.to_string(),
            source,
        };
        let url = match Url::parse(scope.base_uri) {
            Ok(base) => base.join(reference).map_err(invalid)?,
            Err(_) => Url::parse(reference).map_err(invalid)?,
        };
        let mut document_url = url.clone();
        document_url.set_fragment(None);
        let document_uri = document_url.to_string();

        let document = match self.documents.get(&document_uri) {
            Some(doc) => Rc::clone(doc),
            None => {
                debug!("Fetching {document_uri}");
                let text = self.source.fetch(&document_url)?;
                let parsed: Value =
                    serde_json::from_str(&text).map_err(|source| ConversionError::InvalidJson {
                        uri: document_uri.clone(),
                        source,
                    })?;
                let doc = Rc::new(parsed);
                self.documents.insert(document_uri.clone(), Rc::clone(&doc));
                doc
            }
        };

        let pointer = url.fragment().map(fragment_to_pointer).unwrap_or_default();
        let fragment = document.pointer(&pointer).cloned().ok_or_else(|| {
            ConversionError::ReferenceResolution {
                reference: reference.to_string(),
                base_uri: document_uri.clone(),
            }
        })?;

        Ok(Located {
            fragment,
            document: Some(document),
            base_uri: document_uri,
            url: Some(url),
        })
    }

    /// Name and namespace for the type a reference stands for.
    ///
    /// `#/definitions/address/Street` becomes `Street` in `<root>.address`;
    /// a remote document referenced without a fragment is named after its file.
    fn name_from_reference(
        &self,
        reference: &str,
        url: Option<&Url>,
        scope: &Scope,
    ) -> (String, String) {
        let fragment = match url {
            Some(u) => u.fragment().unwrap_or_default(),
            None => reference.strip_prefix('#').unwrap_or_default(),
        };
        let pointer = fragment_to_pointer(fragment);
        if let Some(named) = type_name_from_pointer(&self.root_namespace, &pointer) {
            return named;
        }

        let name = match url.and_then(|u| file_stem(u.path())) {
            Some(stem) => avro_name(&stem),
            None if url.is_none() => avro_name(&self.options.root_class_name),
            None => avro_name(scope.record_name),
        };
        (name, self.root_namespace.clone())
    }
}

fn merge_dependencies(into: &mut Vec<String>, deps: Vec<String>) {
    for dep in deps {
        if !into.contains(&dep) {
            into.push(dep);
        }
    }
}
