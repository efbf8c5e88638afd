use tdd_xml::Element;
use tracing::debug;

use crate::context::{RewriteContext, RewriteTarget};
use crate::error::Result;

/// Element index the second child is moved to.
const MOVED_CHILD_INDEX: usize = 3;

pub(super) fn rewrite_activity(
    element: &mut Element,
    _target: &RewriteTarget<'_>,
    _context: &RewriteContext<'_>,
) -> Result<()> {
    debug!("renaming {} to activities", element.name());
    element.set_name("activities");

    let Some(moved) = element.remove_element(1) else {
        return Ok(());
    };
    debug!("moving {} to position {MOVED_CHILD_INDEX}", moved.name());
    element.insert_element(MOVED_CHILD_INDEX, moved);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::{context, empty_schema, names, target, with_children};
    use tdd_schema::SchemaPath;

    fn run(element: &mut Element) {
        let schema = empty_schema();
        let path = SchemaPath::root();
        rewrite_activity(element, &target("at0001", None, &path), &context(&schema)).expect("rewrite");
    }

    #[test]
    fn second_child_lands_at_index_three() {
        let mut activity = with_children("Medication", &["name", "description", "timing", "action_archetype_id", "extra"]);
        run(&mut activity);
        assert_eq!(activity.name(), "activities");
        assert_eq!(
            names(&activity),
            vec!["name", "timing", "action_archetype_id", "description", "extra"]
        );
    }

    #[test]
    fn short_activities_append_the_moved_child() {
        let mut activity = with_children("Medication", &["name", "description", "timing"]);
        run(&mut activity);
        assert_eq!(names(&activity), vec!["name", "timing", "description"]);
        assert_eq!(activity.element_count(), 3);
    }

    #[test]
    fn single_child_is_left_alone() {
        let mut activity = with_children("Medication", &["name"]);
        run(&mut activity);
        assert_eq!(names(&activity), vec!["name"]);
    }
}
