use tdd_xml::Element;

/// `<name><value>{text}</value></name>`
pub(super) fn name_with_value(text: &str) -> Element {
    Element::new("name").with_child(Element::with_text("value", text))
}

/// Rename every child element except those whose local name is listed.
pub(super) fn rename_children_except(element: &mut Element, keep: &[&str], new_name: &str) {
    for child in element.child_elements_mut() {
        if keep.contains(&child.local_name()) {
            continue;
        }
        tracing::trace!("renaming {} to {new_name}", child.name());
        child.set_name(new_name);
    }
}
