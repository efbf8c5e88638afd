use tdd_xml::Element;
use tracing::{debug, trace};

use crate::context::{RewriteContext, RewriteTarget};
use crate::error::Result;

pub(super) fn rewrite_point_event(
    element: &mut Element,
    _target: &RewriteTarget<'_>,
    _context: &RewriteContext<'_>,
) -> Result<()> {
    if let Some(value) = element.child_mut("name").and_then(|name| name.child_mut("value")) {
        trace!("renaming name/value from {} to ANY_EVENT", value.text());
        value.set_text("ANY_EVENT");
    }

    let trailing_empty_state = element
        .last_element()
        .is_some_and(|last| last.local_name() == "state" && !last.has_element_children());
    if trailing_empty_state {
        debug!("removing empty state");
        let last = element.element_count() - 1;
        element.remove_element(last);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rm_type::RmType;
    use crate::rules::test_support::{context, empty_schema, names, target, with_children};
    use tdd_schema::SchemaPath;

    fn event(state: Element) -> Element {
        Element::new("Any_event")
            .with_child(Element::new("name").with_child(Element::with_text("value", "Any event")))
            .with_child(Element::new("time"))
            .with_child(Element::new("data"))
            .with_child(state)
    }

    fn run(element: &mut Element) {
        let schema = empty_schema();
        let path = SchemaPath::root();
        rewrite_point_event(
            element,
            &target("at0006", Some(&RmType::PointEvent), &path),
            &context(&schema),
        )
        .expect("rewrite");
    }

    #[test]
    fn empty_trailing_state_is_dropped() {
        let mut element = event(Element::new("state"));
        run(&mut element);
        assert_eq!(names(&element), vec!["name", "time", "data"]);
        let name = element.child("name").expect("name");
        assert_eq!(name.text(), "ANY_EVENT");
    }

    #[test]
    fn state_with_content_is_kept() {
        let mut element = event(with_children("state", &["Position"]));
        run(&mut element);
        assert_eq!(names(&element), vec!["name", "time", "data", "state"]);
    }

    #[test]
    fn state_elsewhere_is_kept() {
        let mut element = with_children("Any_event", &["name", "state", "data"]);
        run(&mut element);
        assert_eq!(names(&element), vec!["name", "state", "data"]);
    }
}
