use tdd_xml::Element;
use tracing::debug;

use crate::context::{RewriteContext, RewriteTarget};
use crate::error::Result;

use super::common::{name_with_value, rename_children_except};

pub(super) fn rewrite_item_tree(
    element: &mut Element,
    _target: &RewriteTarget<'_>,
    _context: &RewriteContext<'_>,
) -> Result<()> {
    if !element.has_element_children() {
        return Ok(());
    }
    rename_children_except(element, &[], "items");
    debug!("adding name[value=ITEM_TREE] to {}", element.name());
    element.insert_element(0, name_with_value("ITEM_TREE"));
    Ok(())
}
