#![cfg_attr(feature = "trace", allow(clippy::too_many_arguments))] // crustrace::omni expands fn signatures
//! # jsonschema2avro
//!
//! Convert [JSON Schema](https://json-schema.org/) documents into
//! [Apache Avro](https://avro.apache.org/) schemas.
//!
//! ## Features
//!
//! - Resolves local, relative-file and HTTP(S) `$ref`s, breaking reference cycles
//! - Handles `$defs` / `definitions` collections, Swagger documents and schema arrays
//! - Expands composition keywords (`allOf`, `anyOf`, `oneOf`)
//! - Maps primitive JSON Schema types and formats to Avro (logical) types
//! - Generates records, enums, arrays, maps and unions
//! - Orders named types so each one is defined before it is used
//! - CLI tool `jsonschema2avro` for batch conversion
//!
//! ## Example (Programmatic Usage)
//!
//! ```no_run
//! use serde_json::json;
//! use jsonschema2avro::converter::jsons_to_avro;
//!
//! let schema = json!({
//!     "$schema": "https://json-schema.org/draft/2020-12/schema",
//!     "title": "Example",
//!     "type": "object",
//!     "properties": {
//!         "name": { "type": "string" },
//!         "age": { "type": "integer" }
//!     },
//!     "required": ["name"]
//! });
//!
//! let avro = jsons_to_avro(
//!     &schema,
//!     "example_ns",   // namespace
//!     "example.json", // base URI
//! )
//! .unwrap();
//!
//! println!("{}", serde_json::to_string_pretty(&avro).unwrap());
//! ```
//!
//! ## Example (CLI)
//!
//! ```bash
//! jsonschema2avro schema.json out.avsc
//! ```
//!
//! Or to split top-level records into separate `.avsc` files:
//!
//! ```bash
//! jsonschema2avro schema.json out_dir --split-top-level-records
//! ```
//!
//! ## Crate Layout
//!
//! - [`avro`]: Avro type model (`AvroType`, `AvroField`) and its JSON form
//! - [`common`]: Name sanitisation and the generic JSON type
//! - [`converter`]: JSON Schema → Avro conversion logic
//! - [`dependency_resolver`]: Dependency ordering, inlining and define-once cleanup
//! - [`error`]: Error types
//!
//! The CLI binary is enabled with the `cli` feature.
pub mod avro;
pub mod common;
pub mod converter;
pub mod dependency_resolver;
pub mod error;

pub use error::{ConversionError, Result};
