use tdd_schema::FixedAttribute;
use tdd_xml::Element;
use tracing::{debug, trace, warn};

use crate::context::{RewriteContext, RewriteTarget};
use crate::error::Result;
use crate::namespace::XSI_TYPE;

pub(super) fn rewrite_element(
    element: &mut Element,
    target: &RewriteTarget<'_>,
    context: &RewriteContext<'_>,
) -> Result<()> {
    let value_type = context.schema.lookup(target.path, FixedAttribute::ValueType);
    if value_type.is_none() {
        warn!(
            node = element.name(),
            path = %target.path,
            "ELEMENT has no valueType in schema; value left untyped"
        );
    }

    for child in element.child_elements_mut() {
        match child.local_name() {
            "name" => {
                trace!("keeping only the first child of name");
                child.keep_first_element_only();
            }
            "value" => {
                if let Some(value_type) = value_type.as_deref() {
                    type_value(child, value_type, context);
                }
                break;
            }
            _ => {}
        }
    }
    Ok(())
}

fn type_value(value: &mut Element, value_type: &str, context: &RewriteContext<'_>) {
    trace!("setting xsi:type of value to {value_type}");
    value.set_attribute(XSI_TYPE, context.xsi_type(value_type));
    match value_type {
        "DV_PROPORTION" => insert_denominator(value),
        "DV_QUANTITY" => reorder_quantity(value),
        _ => {}
    }
}

/// DV_PROPORTION carries its kind in `type`; the denominator follows from it.
fn insert_denominator(value: &mut Element) {
    let Some(type_index) = value.element_index_of("type") else {
        warn!("DV_PROPORTION value has no type child; denominator not inferred");
        return;
    };
    let kind = value
        .nth_element(type_index)
        .map(Element::text)
        .unwrap_or_default();
    let denominator = match kind.trim() {
        "1" => "1",
        "2" => "100",
        other => {
            warn!(kind = other, "No denominator for proportion kind");
            ""
        }
    };
    debug!(kind = kind.trim(), denominator, "Inserting DV_PROPORTION denominator");
    value.insert_element(type_index, Element::with_text("denominator", denominator));
}

/// DV_QUANTITY: the last child moves in front of the second-to-last.
fn reorder_quantity(value: &mut Element) {
    let count = value.element_count();
    if count <= 2 {
        return;
    }
    if let Some(last) = value.remove_element(count - 1) {
        trace!("moving {} before second-to-last DV_QUANTITY child", last.name());
        value.insert_element(count - 2, last);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rm_type::RmType;
    use crate::rules::test_support::{context, names, target, with_children};
    use tdd_schema::{SchemaIndex, SchemaPath};

    const SCHEMA: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:element name="Root">
    <xs:complexType><xs:sequence>
      <xs:element name="Rate"><xs:complexType>
        <xs:attribute name="archetype_node_id" fixed="at0001"/>
        <xs:attribute name="valueType" fixed="DV_QUANTITY"/>
      </xs:complexType></xs:element>
      <xs:element name="Share"><xs:complexType>
        <xs:attribute name="archetype_node_id" fixed="at0002"/>
        <xs:attribute name="valueType" fixed="DV_PROPORTION"/>
      </xs:complexType></xs:element>
      <xs:element name="Note"><xs:complexType>
        <xs:attribute name="archetype_node_id" fixed="at0003"/>
        <xs:attribute name="valueType" fixed="DV_TEXT"/>
      </xs:complexType></xs:element>
      <xs:element name="Untyped"><xs:complexType>
        <xs:attribute name="archetype_node_id" fixed="at0004"/>
      </xs:complexType></xs:element>
    </xs:sequence></xs:complexType>
  </xs:element>
</xs:schema>"#;

    fn run(element: &mut Element, name: &str) {
        let schema = SchemaIndex::parse_str(SCHEMA, "inline").expect("schema");
        schema.load();
        let path = SchemaPath::root().child(name);
        rewrite_element(
            element,
            &target("at0001", Some(&RmType::Element), &path),
            &context(&schema),
        )
        .expect("rewrite");
    }

    fn element_with_value(value: Element) -> Element {
        Element::new("Rate")
            .with_child(with_children("name", &["value", "mappings", "defining_code"]))
            .with_child(value)
    }

    #[test]
    fn quantity_units_move_before_precision() {
        let mut element = element_with_value(with_children("value", &["magnitude", "precision", "units"]));
        run(&mut element, "Rate");

        let name = element.child("name").expect("name");
        assert_eq!(names(name), vec!["value"]);
        let value = element.child("value").expect("value");
        assert_eq!(value.attribute("xsi:type"), Some("oe:DV_QUANTITY"));
        assert_eq!(names(value), vec!["magnitude", "units", "precision"]);
    }

    #[test]
    fn short_quantities_keep_their_order() {
        let mut element = element_with_value(with_children("value", &["magnitude", "units"]));
        run(&mut element, "Rate");
        assert_eq!(names(element.child("value").expect("value")), vec!["magnitude", "units"]);
    }

    #[test]
    fn proportion_denominator_follows_kind() {
        for (kind, expected) in [("1", "1"), ("2", "100"), ("0", "")] {
            let value = Element::new("value")
                .with_child(Element::with_text("numerator", "30"))
                .with_child(Element::with_text("type", kind));
            let mut element = element_with_value(value);
            run(&mut element, "Share");

            let value = element.child("value").expect("value");
            assert_eq!(value.attribute("xsi:type"), Some("oe:DV_PROPORTION"));
            assert_eq!(names(value), vec!["numerator", "denominator", "type"]);
            assert_eq!(value.child("denominator").map(Element::text).as_deref(), Some(expected));
        }
    }

    #[test]
    fn other_value_types_are_only_annotated() {
        let mut element = element_with_value(Element::with_text("value", "free text"));
        run(&mut element, "Note");
        let value = element.child("value").expect("value");
        assert_eq!(value.attribute("xsi:type"), Some("oe:DV_TEXT"));
        assert_eq!(value.text(), "free text");
    }

    #[test]
    fn missing_value_type_leaves_value_untyped() {
        let mut element = element_with_value(with_children("value", &["magnitude", "precision", "units"]));
        run(&mut element, "Untyped");
        let value = element.child("value").expect("value");
        assert_eq!(value.attribute("xsi:type"), None);
        assert_eq!(names(value), vec!["magnitude", "precision", "units"]);
        assert_eq!(names(element.child("name").expect("name")), vec!["value"]);
    }
}
