//! ThisAssembly Generator - version-info source emitter
//!
//! # Guarantees
//! 1. Pure: the same record always yields byte-identical text
//! 2. Three dialects (`c#`, `f#`, `vb`), one rendering pipeline
//! 3. Members ordered by name, never by insertion order
//! 4. Full text or an error, never partial output

pub mod record;
pub mod fields;
pub mod dialect;
pub mod hashing;
pub mod logging;
pub mod pipeline;

pub use record::{CodeLanguage, MetadataRecord};
pub use fields::{FieldDescriptor, FieldSpec, FieldType, FieldValue, RenderedField, ValueKind};
pub use dialect::Dialect;
pub use hashing::{canonical_json, compute_record_hash, sha256_hex};
pub use pipeline::{generate_code, CodeGenerator, GenerateError, GeneratedSource};

/// Name written into the generated-code annotation unless the record overrides it.
pub const GENERATOR_NAME: &str = env!("CARGO_PKG_NAME");
pub const GENERATOR_VERSION: &str = env!("CARGO_PKG_VERSION");
