#![deny(unsafe_code)]

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum TransformError {
    /// A node resolved to an RM type with no registered rewrite rule.
    #[error("unsupported RM type '{rm_type}'")]
    UnsupportedType { rm_type: String },

    #[error("no schema found for template {template_id} (schema location: {location})")]
    SchemaUnresolved { template_id: String, location: String },

    #[error("invalid input document: {0}")]
    Input(#[from] tdd_xml::XmlError),
}

impl TransformError {
    pub(crate) fn unsupported(rm_type: impl Into<String>) -> Self {
        Self::UnsupportedType {
            rm_type: rm_type.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TransformError>;
