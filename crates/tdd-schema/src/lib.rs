#![deny(unsafe_code)]

//! Schema side of the TDD transformer.
//!
//! A TDS is the XML Schema a template designer exports for one template. Its
//! element definitions carry the openEHR metadata (archetype node id, RM type,
//! value type) as fixed attribute values. This crate indexes that metadata by
//! structural path, persists the index per template id, and resolves schemas
//! by template id or schema location.

pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod index;
pub mod path;
pub mod registry;

pub use crate::cache::CacheStore;
pub use crate::config::Settings;
pub use crate::error::{Result, SchemaError};
pub use crate::index::{ElementMetadata, SchemaIndex};
pub use crate::path::{FixedAttribute, SchemaPath};
pub use crate::registry::{SchemaResolver, TemplateRegistry};
