//! Stamp applied to every locatable node before its type-specific rule.

use tdd_xml::Element;
use tracing::{debug, trace};

use crate::context::{RewriteContext, RewriteTarget};
use crate::error::Result;
use crate::namespace::XSI_TYPE;
use crate::rm_type::is_archetype_root;

const ARCHETYPE_DETAILS: &str = "archetype_details";

pub(crate) fn rewrite_locatable(
    element: &mut Element,
    target: &RewriteTarget<'_>,
    context: &RewriteContext<'_>,
) -> Result<()> {
    trace!(node = element.name(), node_id = target.node_id, "Stamping locatable");
    element.set_attribute("archetype_node_id", target.node_id);
    if let Some(rm_type) = target.rm_type {
        element.set_attribute(XSI_TYPE, context.xsi_type(rm_type.as_str()));
    }

    if !is_archetype_root(target.node_id) || element.child(ARCHETYPE_DETAILS).is_some() {
        return Ok(());
    }
    // Before the last feeder_audit when present, otherwise second.
    let index = element.last_element_index_of("feeder_audit").unwrap_or(1);
    debug!(node = element.name(), index, "Inserting archetype_details");
    element.insert_element(index, archetype_details(target.node_id, context));
    Ok(())
}

fn archetype_details(node_id: &str, context: &RewriteContext<'_>) -> Element {
    Element::new(ARCHETYPE_DETAILS)
        .with_child(Element::new("archetype_id").with_child(Element::with_text("value", node_id)))
        .with_child(Element::new("template_id").with_child(Element::with_text("value", context.template_id)))
        .with_child(Element::with_text("rm_version", context.rm_version))
}
