#![deny(unsafe_code)]

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    #[error("failed to {operation} {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed XML at byte {position}: {message}")]
    Malformed { position: u64, message: String },

    #[error("document has no root element")]
    MissingRoot,

    #[error("unexpected closing tag </{found}> (expected </{expected}>)")]
    MismatchedTag { expected: String, found: String },

    #[error("unclosed element <{name}> at end of document")]
    Unclosed { name: String },

    #[error("failed to write XML: {message}")]
    Write { message: String },
}

impl XmlError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(position: u64, message: impl Into<String>) -> Self {
        Self::Malformed {
            position,
            message: message.into(),
        }
    }

    pub(crate) fn write(error: impl std::fmt::Display) -> Self {
        Self::Write {
            message: error.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, XmlError>;
