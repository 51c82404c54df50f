use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure to fetch the text of a referenced document.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request to {uri} failed: {source}")]
    Http {
        uri: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("HTTP request to {uri} returned status {status}")]
    HttpStatus { uri: String, status: u16 },
    #[error("Error reading file at {path:?}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Invalid file URL: {0}")]
    InvalidFileUrl(String),
    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),
    #[error("No content registered for {0}")]
    NotFound(String),
}

#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("Error resolving JSON Pointer reference {reference} for {base_uri}")]
    ReferenceResolution { reference: String, base_uri: String },
    #[error("Invalid $ref {reference}: {source}")]
    InvalidReference {
        reference: String,
        #[source]
        source: url::ParseError,
    },
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("Error decoding JSON from {uri}: {source}")]
    InvalidJson {
        uri: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Cannot determine record name for {0}")]
    MissingRecordName(String),
    #[error("No schema found in {0}")]
    NoSchemaFound(String),
    #[error("Failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, ConversionError>;
