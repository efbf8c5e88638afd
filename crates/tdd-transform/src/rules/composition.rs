use tdd_xml::Element;
use tracing::{debug, trace};

use crate::context::{RewriteContext, RewriteTarget};
use crate::error::Result;
use crate::namespace::normalize_namespaces;

/// COMPOSITION is the document root and is rewritten last, so namespace
/// normalization runs here over the finished tree.
pub(super) fn rewrite_composition(
    element: &mut Element,
    _target: &RewriteTarget<'_>,
    context: &RewriteContext<'_>,
) -> Result<()> {
    debug!("renaming {} to composition", element.name());
    element.set_name("composition");

    for child in element.child_elements_mut().rev() {
        if child.local_name() == "context" {
            break;
        }
        trace!("renaming {} to content", child.name());
        child.set_name("content");
    }

    normalize_namespaces(element, context.prefix, context.namespace_style);
    Ok(())
}
