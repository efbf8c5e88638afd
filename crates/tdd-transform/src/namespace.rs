//! openEHR namespace handling.
//!
//! The output namespace prefix is derived once per instance from the root's
//! declarations. During rewriting every `xsi:type` value is written with that
//! prefix; once the composition root is reached, [`normalize_namespaces`]
//! rewrites the declarations and element names for the chosen
//! [`NamespaceStyle`].

use tdd_xml::Element;
use tdd_xml::node::split_qname;
use tracing::{debug, warn};

pub const OPENEHR_NS: &str = "http://schemas.openehr.org/v1";
pub const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";
pub const RM_VERSION: &str = "1.0.2";
pub const COMPOSITION_XSD: &str =
    "https://specifications.openehr.org/releases/1.0.2/its/XML-schema/Composition.xsd";

/// Prefix used when the RM namespace is the default namespace (or undeclared).
pub const DEFAULT_PREFIX: &str = "oe:";

pub const XSI_TYPE: &str = "xsi:type";
const XSI_SCHEMA_LOCATION: &str = "xsi:schemaLocation";
const XMLNS_XSI: &str = "xmlns:xsi";

/// How the RM namespace appears in the output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NamespaceStyle {
    /// Declared with the resolved prefix; every element name is qualified.
    #[default]
    Prefixed,
    /// Declared as the default namespace; element names and `xsi:type`
    /// values are unqualified.
    Default,
}

/// Prefix (with trailing colon) bound to the RM namespace on `root`.
pub fn resolve_prefix(root: &Element) -> String {
    for attribute in root.attributes() {
        if attribute.value != OPENEHR_NS {
            continue;
        }
        if attribute.name == "xmlns" {
            return DEFAULT_PREFIX.to_string();
        }
        if let Some(prefix) = attribute.name.strip_prefix("xmlns:") {
            return format!("{prefix}:");
        }
    }
    warn!(
        "Root element does not declare {OPENEHR_NS}; using prefix {DEFAULT_PREFIX}"
    );
    DEFAULT_PREFIX.to_string()
}

/// `prefix` + local part of `name`, replacing any existing prefix.
pub fn qualify(prefix: &str, name: &str) -> String {
    format!("{prefix}{}", split_qname(name).1)
}

/// `xsi:schemaLocation` value for RM compositions.
pub fn composition_schema_location() -> String {
    format!("{OPENEHR_NS} {COMPOSITION_XSD}")
}

/// Rewrite declarations on the composition root and re-qualify the tree.
pub fn normalize_namespaces(root: &mut Element, prefix: &str, style: NamespaceStyle) {
    let prefix_name = prefix.trim_end_matches(':');
    let rm_declaration = format!("xmlns:{prefix_name}");

    root.remove_attribute("template_id");
    root.remove_attribute("xmlns");
    root.remove_attribute(&rm_declaration);
    remove_schema_locations(root);

    match style {
        NamespaceStyle::Prefixed => {
            debug!(prefix, "Qualifying composition with RM namespace prefix");
            root.set_attribute(rm_declaration, OPENEHR_NS);
        }
        NamespaceStyle::Default => {
            debug!("Declaring RM namespace as default namespace");
            root.set_attribute("xmlns", OPENEHR_NS);
        }
    }
    if root.attribute(XMLNS_XSI).is_none() {
        root.set_attribute(XMLNS_XSI, XSI_NS);
    }
    root.set_attribute(XSI_SCHEMA_LOCATION, composition_schema_location());

    let element_prefix = match style {
        NamespaceStyle::Prefixed => prefix,
        NamespaceStyle::Default => "",
    };
    root.for_each_postorder_mut(&mut |element: &mut Element| {
        let name = qualify(element_prefix, element.name());
        element.set_name(name);
        if let Some(value) = element.attribute(XSI_TYPE) {
            let value = qualify(element_prefix, value);
            element.set_attribute(XSI_TYPE, value);
        }
    });
}

/// Drop `schemaLocation` under every prefix bound to the XSI namespace.
fn remove_schema_locations(root: &mut Element) {
    let xsi_prefixes: Vec<String> = root
        .attributes()
        .iter()
        .filter(|attribute| attribute.value == XSI_NS)
        .filter_map(|attribute| attribute.name.strip_prefix("xmlns:"))
        .map(str::to_string)
        .collect();
    root.retain_attributes(|attribute| match split_qname(&attribute.name) {
        (Some(prefix), "schemaLocation") => {
            prefix != "xsi" && !xsi_prefixes.iter().any(|bound| bound == prefix)
        }
        _ => true,
    });
}
