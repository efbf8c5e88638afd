use tdd_xml::Element;
use tracing::{debug, warn};

use crate::context::{RewriteContext, RewriteTarget};
use crate::error::Result;
use crate::namespace::XSI_TYPE;

use super::common::name_with_value;

pub(super) fn rewrite_observation(
    element: &mut Element,
    target: &RewriteTarget<'_>,
    context: &RewriteContext<'_>,
) -> Result<()> {
    let Some(data) = element.child_mut("data") else {
        warn!(node_id = target.node_id, "OBSERVATION has no data child; history not rewritten");
        return Ok(());
    };

    debug!("setting xsi:type of data to HISTORY");
    data.set_attribute(XSI_TYPE, context.xsi_type("HISTORY"));
    data.insert_element(0, name_with_value("HISTORY"));

    let mut has_origin = false;
    for child in data.child_elements_mut() {
        match child.local_name() {
            "name" => {}
            "origin" => has_origin = true,
            _ => {
                debug!("renaming {} to events", child.name());
                child.set_name("events");
            }
        }
    }

    if !has_origin {
        debug!(origin = context.origin_time, "adding origin to history");
        let origin = Element::new("origin").with_child(Element::with_text("value", context.origin_time));
        data.insert_element(1, origin);
    }
    Ok(())
}
