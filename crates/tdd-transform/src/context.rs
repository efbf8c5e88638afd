//! Inputs shared by every rewrite rule during one transform.

use tdd_schema::{SchemaIndex, SchemaPath};

use crate::namespace::NamespaceStyle;
use crate::rm_type::RmType;

/// Per-transform settings handed to each rule.
#[derive(Debug, Clone, Copy)]
pub struct RewriteContext<'a> {
    /// Template id stamped into `archetype_details`.
    pub template_id: &'a str,
    /// RM namespace prefix with trailing colon, e.g. `oe:`.
    pub prefix: &'a str,
    pub rm_version: &'a str,
    /// Timestamp written into synthesized OBSERVATION origins.
    pub origin_time: &'a str,
    pub namespace_style: NamespaceStyle,
    /// Schema the instance was generated against.
    pub schema: &'a SchemaIndex,
}

impl RewriteContext<'_> {
    /// `xsi:type` value for an RM type name.
    pub fn xsi_type(&self, type_name: &str) -> String {
        format!("{}{type_name}", self.prefix)
    }
}

/// The node a rule is applied to, as resolved by the engine.
#[derive(Debug, Clone, Copy)]
pub struct RewriteTarget<'a> {
    pub node_id: &'a str,
    pub rm_type: Option<&'a RmType>,
    pub path: &'a SchemaPath,
}
