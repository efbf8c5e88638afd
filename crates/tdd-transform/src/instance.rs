//! TDD instance documents.

use std::path::Path;
use std::sync::{Arc, LazyLock, OnceLock};

use regex::Regex;
use tdd_schema::{SchemaIndex, SchemaResolver};
use tdd_xml::{Document, Element};
use tracing::{debug, warn};

use crate::error::{Result, TransformError};
use crate::namespace::resolve_prefix;

/// Schema location pair for Ocean template data documents.
static TDS_LOCATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"http://schemas\.oceanehr\.com/templates ([^\s]*)").expect("Invalid TDS location regex")
});

/// A parsed TDD document. The source tree is never modified; transforms
/// work on a clone.
#[derive(Debug)]
pub struct TemplateInstance {
    document: Document,
    prefix: OnceLock<String>,
}

impl TemplateInstance {
    pub fn from_document(document: Document) -> Self {
        Self {
            document,
            prefix: OnceLock::new(),
        }
    }

    pub fn parse_str(source: &str) -> Result<Self> {
        Ok(Self::from_document(Document::parse_str(source)?))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        Ok(Self::from_document(Document::from_path(path)?))
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn root(&self) -> &Element {
        &self.document.root
    }

    pub fn template_id(&self) -> Option<&str> {
        self.root().attribute("template_id")
    }

    /// Location of the TDS named in the root's `xsi:schemaLocation`.
    pub fn schema_location(&self) -> Option<&str> {
        let value = self.root().attribute_local("schemaLocation")?;
        TDS_LOCATION
            .captures(value)
            .and_then(|captures| captures.get(1))
            .map(|m| m.as_str())
            .filter(|location| !location.is_empty())
    }

    /// RM namespace prefix, derived once from the root declarations.
    pub fn namespace_prefix(&self) -> &str {
        self.prefix.get_or_init(|| resolve_prefix(self.root()))
    }

    /// Find the schema for this instance: by template id first, then by
    /// schema location.
    pub fn resolve_schema(&self, resolver: &dyn SchemaResolver) -> Result<Arc<SchemaIndex>> {
        if let Some(template_id) = self.template_id() {
            if let Some(index) = resolver.resolve_by_template_id(template_id) {
                debug!(template_id, "Resolved schema by template id");
                return Ok(index);
            }
        } else {
            warn!("Instance root has no template_id attribute");
        }
        if let Some(location) = self.schema_location() {
            if let Some(index) = resolver.resolve_by_location(location) {
                debug!(location, "Resolved schema by location");
                return Ok(index);
            }
        }
        Err(TransformError::SchemaUnresolved {
            template_id: self.template_id().unwrap_or("<none>").to_string(),
            location: self.schema_location().unwrap_or("<none>").to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INSTANCE: &str = r#"<Encounter xmlns="http://schemas.oceanehr.com/templates"
        xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
        xmlns:rm="http://schemas.openehr.org/v1"
        template_id="t1"
        xsi:schemaLocation="http://schemas.oceanehr.com/templates https://example.org/t1.xsd">
      <name><value>Encounter</value></name>
    </Encounter>"#;

    #[test]
    fn reads_root_metadata() {
        let instance = TemplateInstance::parse_str(INSTANCE).expect("parse");
        assert_eq!(instance.template_id(), Some("t1"));
        assert_eq!(instance.schema_location(), Some("https://example.org/t1.xsd"));
        assert_eq!(instance.namespace_prefix(), "rm:");
    }

    #[test]
    fn foreign_schema_locations_are_ignored() {
        let instance = TemplateInstance::parse_str(
            r#"<x xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:schemaLocation="urn:a b.xsd"/>"#,
        )
        .expect("parse");
        assert_eq!(instance.schema_location(), None);
        assert_eq!(instance.template_id(), None);
    }

    #[test]
    fn malformed_input_is_an_error() {
        assert!(matches!(
            TemplateInstance::parse_str("<Encounter><name></Encounter>"),
            Err(TransformError::Input(_))
        ));
    }
}
