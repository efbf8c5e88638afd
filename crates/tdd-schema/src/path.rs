//! Structural path signatures into a TDS.
//!
//! A signature addresses a schema element definition by the chain of element
//! names leading to it from the schema's top-level element:
//!
//! ```text
//! /schema[1]/element[1]
//! (/schema[1]/element[1]//element[@name='Vital_signs'])[1]
//! ((/schema[1]/element[1]//element[@name='Vital_signs'])[1]//element[@name='data'])[1]
//! ```
//!
//! Each step selects the first descendant element definition with the given
//! name, so the signature for an instance node depends only on the local names
//! of its ancestors. The same string doubles as the cache key prefix for the
//! fixed attributes of that definition.

use std::fmt;

/// Signature of the schema's top-level element definition.
pub const ROOT_SIGNATURE: &str = "/schema[1]/element[1]";

/// A schema element path, kept both as its signature string and as the list
/// of element-name steps used to evaluate it against a live schema tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SchemaPath {
    steps: Vec<String>,
    signature: String,
}

impl SchemaPath {
    pub fn root() -> Self {
        Self {
            steps: Vec::new(),
            signature: ROOT_SIGNATURE.to_string(),
        }
    }

    /// Extend the path by one named descendant step.
    #[must_use]
    pub fn child(&self, name: &str) -> Self {
        let mut steps = self.steps.clone();
        steps.push(name.to_string());
        Self {
            steps,
            signature: format!("({}//element[@name='{name}'])[1]", self.signature),
        }
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn steps(&self) -> &[String] {
        &self.steps
    }

    pub fn depth(&self) -> usize {
        self.steps.len()
    }

    pub fn is_root(&self) -> bool {
        self.steps.is_empty()
    }
}

impl Default for SchemaPath {
    fn default() -> Self {
        Self::root()
    }
}

impl fmt::Display for SchemaPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.signature)
    }
}

/// Fixed attributes a TDS declares on an element's complex type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FixedAttribute {
    ArchetypeNodeId,
    RmType,
    ValueType,
    /// Only meaningful on the top-level element.
    TemplateId,
}

impl FixedAttribute {
    /// The three attributes recorded for every element definition.
    pub const ELEMENT: [FixedAttribute; 3] = [
        FixedAttribute::ArchetypeNodeId,
        FixedAttribute::RmType,
        FixedAttribute::ValueType,
    ];

    /// Attribute name as written in the schema.
    pub fn schema_name(self) -> &'static str {
        match self {
            FixedAttribute::ArchetypeNodeId => "archetype_node_id",
            FixedAttribute::RmType => "type",
            FixedAttribute::ValueType => "valueType",
            FixedAttribute::TemplateId => "template_id",
        }
    }

    /// Cache key for this attribute on the element at `path`.
    pub fn key(self, path: &SchemaPath) -> String {
        format!("{}{}", path.signature(), self.key_suffix())
    }

    /// Split a cache key back into its signature and attribute.
    pub fn split_key(key: &str) -> Option<(&str, FixedAttribute)> {
        [
            FixedAttribute::ArchetypeNodeId,
            FixedAttribute::RmType,
            FixedAttribute::ValueType,
            FixedAttribute::TemplateId,
        ]
        .into_iter()
        .find_map(|attribute| {
            key.strip_suffix(attribute.key_suffix().as_str())
                .map(|signature| (signature, attribute))
        })
    }

    fn key_suffix(self) -> String {
        format!("/complexType[1]/attribute[@name='{}'][1]/@fixed", self.schema_name())
    }
}

/// Element names along a signature, outermost first. Empty for the root.
pub fn signature_names(signature: &str) -> Vec<&str> {
    signature
        .split("//element[@name='")
        .skip(1)
        .filter_map(|part| part.split_once("']").map(|(name, _)| name))
        .collect()
}
