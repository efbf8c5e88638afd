//! Parse XML text into a [`Document`].

use std::borrow::Cow;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::{Result, XmlError};
use crate::node::{Document, Element, Node};

/// Parse `source` into an owned tree.
///
/// Whitespace-only text between child elements is dropped; the declaration,
/// processing instructions and doctype are not kept.
pub fn parse_document(source: &str) -> Result<Document> {
    let mut reader = Reader::from_str(source);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let position = reader.buffer_position();
        let event = reader
            .read_event()
            .map_err(|e| XmlError::malformed(position, e.to_string()))?;
        match event {
            Event::Start(start) => {
                stack.push(element_from_start(&start, position)?);
            }
            Event::Empty(start) => {
                let element = element_from_start(&start, position)?;
                attach(&mut stack, &mut root, element, position)?;
            }
            Event::End(end) => {
                let qname = end.name();
                let found = utf8(qname.as_ref(), position)?.to_string();
                let element = stack.pop().ok_or_else(|| XmlError::MismatchedTag {
                    expected: String::new(),
                    found: found.clone(),
                })?;
                if element.name() != found {
                    return Err(XmlError::MismatchedTag {
                        expected: element.name().to_string(),
                        found,
                    });
                }
                attach(&mut stack, &mut root, element, position)?;
            }
            Event::Text(text) => {
                let raw = utf8(&text, position)?;
                let value = unescape(raw, position)?;
                push_text(&mut stack, &value);
            }
            Event::GeneralRef(reference) => {
                let name = reference
                    .decode()
                    .map_err(|e| XmlError::malformed(position, e.to_string()))?;
                let resolved = resolve_reference(&name, position)?;
                push_text(&mut stack, &resolved);
            }
            Event::CData(cdata) => {
                let value = utf8(&cdata, position)?.to_string();
                if let Some(parent) = stack.last_mut() {
                    parent.children_mut().push(Node::CData(value));
                }
            }
            Event::Comment(comment) => {
                let value = utf8(&comment, position)?.to_string();
                if let Some(parent) = stack.last_mut() {
                    parent.children_mut().push(Node::Comment(value));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.pop() {
        return Err(XmlError::Unclosed {
            name: open.name().to_string(),
        });
    }
    root.map(Document::new).ok_or(XmlError::MissingRoot)
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    mut element: Element,
    position: u64,
) -> Result<()> {
    strip_indentation(&mut element);
    match stack.last_mut() {
        Some(parent) => {
            parent.push_element(element);
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(element);
            Ok(())
        }
        None => Err(XmlError::malformed(
            position,
            format!("second root element <{}>", element.name()),
        )),
    }
}

/// Append text, merging with a preceding text node so entity references
/// split by the reader end up in one string.
fn push_text(stack: &mut [Element], value: &str) {
    let Some(parent) = stack.last_mut() else {
        return;
    };
    if let Some(Node::Text(existing)) = parent.children_mut().last_mut() {
        existing.push_str(value);
    } else {
        parent.children_mut().push(Node::Text(value.to_string()));
    }
}

fn element_from_start(start: &BytesStart<'_>, position: u64) -> Result<Element> {
    let qname = start.name();
    let name = utf8(qname.as_ref(), position)?;
    let mut element = Element::new(name);
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| XmlError::malformed(position, e.to_string()))?;
        let key = utf8(attribute.key.as_ref(), position)?;
        let raw = utf8(&attribute.value, position)?;
        let value = unescape(raw, position)?;
        element.set_attribute(key, value.into_owned());
    }
    Ok(element)
}

/// Drop whitespace-only text between child elements (source indentation).
fn strip_indentation(element: &mut Element) {
    if !element.has_element_children() {
        return;
    }
    element
        .children_mut()
        .retain(|node| !matches!(node, Node::Text(text) if text.trim().is_empty()));
}

fn utf8(bytes: &[u8], position: u64) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|e| XmlError::malformed(position, e.to_string()))
}

fn unescape(raw: &str, position: u64) -> Result<Cow<'_, str>> {
    quick_xml::escape::unescape(raw).map_err(|e| XmlError::malformed(position, e.to_string()))
}

fn resolve_reference(name: &str, position: u64) -> Result<String> {
    if let Some(number) = name.strip_prefix('#') {
        let code = match number.strip_prefix('x').or_else(|| number.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16),
            None => number.parse::<u32>(),
        }
        .map_err(|_| XmlError::malformed(position, format!("invalid character reference &{name};")))?;
        return char::from_u32(code)
            .map(String::from)
            .ok_or_else(|| XmlError::malformed(position, format!("invalid character reference &{name};")));
    }
    quick_xml::escape::resolve_predefined_entity(name)
        .map(str::to_string)
        .ok_or_else(|| XmlError::malformed(position, format!("unknown entity &{name};")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_elements_and_attributes() {
        let doc = parse_document(
            r#"<?xml version="1.0"?>
            <root a="1" xmlns:oe="http://schemas.openehr.org/v1">
              <oe:child b="x &amp; y">text</oe:child>
              <empty/>
            </root>"#,
        )
        .expect("parse");
        assert_eq!(doc.root.name(), "root");
        assert_eq!(doc.root.attribute("a"), Some("1"));
        let child = doc.root.nth_element(0).expect("child");
        assert_eq!(child.name(), "oe:child");
        assert_eq!(child.attribute("b"), Some("x & y"));
        assert_eq!(child.text(), "text");
        assert_eq!(doc.root.element_count(), 2);
    }

    #[test]
    fn entity_references_join_surrounding_text() {
        let doc = parse_document("<r>a &lt; b &#65;&#x42;</r>").expect("parse");
        assert_eq!(doc.root.text(), "a < b AB");
        assert_eq!(doc.root.children().len(), 1);
    }

    #[test]
    fn comments_and_cdata_are_kept() {
        let doc = parse_document("<r><!-- note --><![CDATA[<raw>]]></r>").expect("parse");
        assert!(matches!(doc.root.children()[0], Node::Comment(_)));
        assert_eq!(doc.root.text(), "<raw>");
    }

    #[test]
    fn mismatched_tags_are_rejected() {
        let error = parse_document("<a><b></a>").expect_err("mismatch");
        assert!(matches!(
            error,
            XmlError::MismatchedTag { .. } | XmlError::Malformed { .. }
        ));
    }

    #[test]
    fn unclosed_and_empty_documents_are_rejected() {
        assert!(parse_document("<a><b/>").is_err());
        assert!(matches!(parse_document("   "), Err(XmlError::MissingRoot)));
    }
}
