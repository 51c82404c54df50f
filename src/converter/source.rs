use crate::error::FetchError;
use reqwest::blocking::Client;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::time::Duration;
use url::Url;

/// Resolves a URI to the raw text of a schema document.
pub trait ContentSource: fmt::Debug {
    fn fetch(&self, uri: &Url) -> Result<String, FetchError>;
}

/// Reads `file://` URIs from disk and fetches `http(s)://` URIs over the network.
#[derive(Debug)]
pub struct DefaultContentSource {
    timeout: Duration,
}

impl Default for DefaultContentSource {
    fn default() -> Self {
        Self::new()
    }
}

impl DefaultContentSource {
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }

    fn fetch_http(&self, uri: &Url) -> Result<String, FetchError> {
        let http_error = |source| FetchError::Http {
            uri: uri.to_string(),
            source,
        };
        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(http_error)?;
        let resp = client.get(uri.as_str()).send().map_err(http_error)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                uri: uri.to_string(),
                status: status.as_u16(),
            });
        }
        resp.text().map_err(http_error)
    }
}

impl ContentSource for DefaultContentSource {
    fn fetch(&self, uri: &Url) -> Result<String, FetchError> {
        match uri.scheme() {
            "http" | "https" => self.fetch_http(uri),
            "file" => {
                let path = uri
                    .to_file_path()
                    .map_err(|_| FetchError::InvalidFileUrl(uri.to_string()))?;
                fs::read_to_string(&path).map_err(|source| FetchError::File { path, source })
            }
            other => Err(FetchError::UnsupportedScheme(other.to_string())),
        }
    }
}

/// Serves pre-loaded documents keyed by URI (without fragment).
#[derive(Debug, Default, Clone)]
pub struct InMemorySource {
    documents: HashMap<String, String>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, uri: &str, content: impl Into<String>) -> Self {
        self.insert(uri, content);
        self
    }

    pub fn insert(&mut self, uri: &str, content: impl Into<String>) {
        self.documents.insert(uri.to_string(), content.into());
    }
}

impl ContentSource for InMemorySource {
    fn fetch(&self, uri: &Url) -> Result<String, FetchError> {
        let mut key = uri.clone();
        key.set_fragment(None);
        self.documents
            .get(key.as_str())
            .cloned()
            .ok_or_else(|| FetchError::NotFound(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn in_memory_source_ignores_fragment() {
        let source = InMemorySource::new().with_document("https://example.com/a.json", "{}");
        let uri = Url::parse("https://example.com/a.json#/definitions/X").unwrap();
        assert_eq!(source.fetch(&uri).unwrap(), "{}");
    }

    #[test]
    fn in_memory_source_reports_missing_document() {
        let source = InMemorySource::new();
        let uri = Url::parse("https://example.com/missing.json").unwrap();
        assert!(matches!(source.fetch(&uri), Err(FetchError::NotFound(_))));
    }

    #[test]
    fn default_source_reads_files() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"type": "string"}"#).unwrap();
        let uri = Url::from_file_path(file.path()).unwrap();
        let text = DefaultContentSource::new().fetch(&uri).unwrap();
        assert_eq!(text, r#"{"type": "string"}"#);
    }

    #[test]
    fn default_source_reports_missing_file_as_error() {
        let uri = Url::parse("file:///definitely/not/here.json").unwrap();
        let err = DefaultContentSource::new().fetch(&uri).unwrap_err();
        assert!(matches!(err, FetchError::File { .. }));
    }

    #[test]
    fn default_source_rejects_unknown_scheme() {
        let uri = Url::parse("ftp://example.com/a.json").unwrap();
        let err = DefaultContentSource::new().fetch(&uri).unwrap_err();
        assert!(matches!(err, FetchError::UnsupportedScheme(s) if s == "ftp"));
    }
}
