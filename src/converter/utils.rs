use std::path::Path;
use url::Url;

use crate::common::names::avro_namespace;

/// Compose a namespace string from multiple parts.
///
/// Empty parts are skipped. Each part is normalized with `avro_namespace`.
pub fn compose_namespace(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .map(|p| avro_namespace(p))
        .collect::<Vec<_>>()
        .join(".")
}

/// Convert a JSON Schema `$id` URI into an Avro namespace.
///
/// The host is reversed (`schemas.example.com` → `com.example.schemas`) and
/// followed by the path segments in reverse order, with the file extension
/// dropped and `-` replaced by `_`.
pub fn id_to_avro_namespace(id: &str) -> String {
    let Ok(parsed_url) = Url::parse(id) else {
        return String::new();
    };
    let path = parsed_url.path().trim_matches('/');
    let path_no_ext = path.split('.').next().unwrap_or("").replace('-', "_");
    let reversed_path_segments: Vec<&str> = path_no_ext
        .split('/')
        .filter(|s| !s.is_empty())
        .rev()
        .collect();
    let namespace_suffix = compose_namespace(&reversed_path_segments);

    let namespace_prefix = parsed_url
        .host_str()
        .map(|h| {
            let parts: Vec<&str> = h.split('.').rev().collect();
            compose_namespace(&parts)
        })
        .unwrap_or_default();

    compose_namespace(&[&namespace_prefix, &namespace_suffix])
}

/// Derive a namespace from the basename of a file path or URL:
/// `schemas/my-event.v1.json` → `my_event`.
pub fn basename_to_avro_namespace(location: &str) -> String {
    let without_fragment = location.split('#').next().unwrap_or(location);
    let normalized = without_fragment.replace('\\', "/").replace('-', "_");
    let basename = normalized.rsplit('/').next().unwrap_or("");
    let stem = basename.split('.').next().unwrap_or("");
    avro_namespace(stem)
}

/// File stem of a path or URL, used to name types imported from whole documents.
pub fn file_stem(location: &str) -> Option<String> {
    let path = match Url::parse(location) {
        Ok(url) => url.path().to_string(),
        Err(_) => location.to_string(),
    };
    Path::new(&path)
        .file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.split('.').next().unwrap_or(s).to_string())
        .filter(|s| !s.is_empty())
}

/// Turn a CLI input (path or URI) into an absolute URI string.
pub fn to_base_uri(location: &str) -> String {
    if let Ok(url) = Url::parse(location) {
        if url.scheme().len() > 1 {
            return url.to_string();
        }
    }
    let (path, fragment) = match location.split_once('#') {
        Some((p, f)) => (p, Some(f)),
        None => (location, None),
    };
    let absolute = std::path::absolute(path).unwrap_or_else(|_| Path::new(path).to_path_buf());
    match Url::from_file_path(&absolute) {
        Ok(mut url) => {
            url.set_fragment(fragment);
            url.to_string()
        }
        Err(_) => location.to_string(),
    }
}
