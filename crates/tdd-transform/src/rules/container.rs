use tdd_xml::Element;

use crate::context::{RewriteContext, RewriteTarget};
use crate::error::Result;

use super::common::rename_children_except;

/// CLUSTER and SECTION: every member becomes an `items` child.
pub(super) fn rewrite_container(
    element: &mut Element,
    _target: &RewriteTarget<'_>,
    _context: &RewriteContext<'_>,
) -> Result<()> {
    rename_children_except(element, &["name", "archetype_details"], "items");
    Ok(())
}
