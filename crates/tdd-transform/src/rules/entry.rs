use tdd_xml::Element;
use tracing::trace;

use crate::context::{RewriteContext, RewriteTarget};
use crate::error::Result;

/// ACTION, ADMIN_ENTRY, EVALUATION, INSTRUCTION and INTERVAL_EVENT nodes
/// already have RM shape once the locatable stamp is applied.
pub(super) fn rewrite_entry(
    element: &mut Element,
    target: &RewriteTarget<'_>,
    _context: &RewriteContext<'_>,
) -> Result<()> {
    trace!(
        node = element.name(),
        rm_type = ?target.rm_type.map(crate::rm_type::RmType::as_str),
        "No structural rewrite"
    );
    Ok(())
}
