#![deny(unsafe_code)]

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SchemaError {
    #[error("failed to {operation} {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse schema {location}: {source}")]
    Xml {
        location: String,
        #[source]
        source: tdd_xml::XmlError,
    },

    #[error("failed to parse configuration {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid cache file {path}: {reason}")]
    InvalidCache { path: PathBuf, reason: String },

    #[error("cache file {path} has version {found} (supported: {max_supported})")]
    UnsupportedCacheVersion {
        found: u32,
        max_supported: u32,
        path: PathBuf,
    },

    #[error("failed to serialize schema index: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("invalid schema location {location}: {reason}")]
    InvalidLocation { location: String, reason: String },

    #[error("failed to fetch schema from {location}: {source}")]
    Network {
        location: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("schema request to {location} returned HTTP {status}")]
    HttpStatus { location: String, status: u16 },

    #[error("schema index has no template id")]
    MissingTemplateId,
}

impl SchemaError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    /// True for a cache or schema file that simply is not there.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

pub type Result<T> = std::result::Result<T, SchemaError>;
