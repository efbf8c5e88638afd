//! Serialize a [`Document`] with `quick-xml`.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use quick_xml::Writer;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::error::{Result, XmlError};
use crate::node::{Document, Element, Node};

pub fn document_to_string(document: &Document) -> Result<String> {
    let bytes = document_to_bytes(document)?;
    String::from_utf8(bytes).map_err(XmlError::write)
}

pub fn document_to_bytes(document: &Document) -> Result<Vec<u8>> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(XmlError::write)?;
    write_element(&mut writer, &document.root)?;
    let mut bytes = writer.into_inner();
    bytes.push(b'\n');
    Ok(bytes)
}

/// Write the document to `path` through a temp file and rename.
pub fn write_document(document: &Document, path: &Path) -> Result<()> {
    let bytes = document_to_bytes(document)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| XmlError::io("create directory", parent, e))?;
    }
    let temp_path = path.with_extension("xml.tmp");
    let mut file = File::create(&temp_path).map_err(|e| XmlError::io("create", &temp_path, e))?;
    file.write_all(&bytes)
        .map_err(|e| XmlError::io("write", &temp_path, e))?;
    file.sync_all()
        .map_err(|e| XmlError::io("sync", &temp_path, e))?;
    fs::rename(&temp_path, path).map_err(|e| XmlError::io("rename", path, e))?;
    tracing::debug!("Wrote XML document to {}", path.display());
    Ok(())
}

fn write_element<W: Write>(writer: &mut Writer<W>, element: &Element) -> Result<()> {
    let mut start = BytesStart::new(element.name());
    for attribute in element.attributes() {
        start.push_attribute((attribute.name.as_str(), attribute.value.as_str()));
    }
    if element.children().is_empty() {
        writer
            .write_event(Event::Empty(start))
            .map_err(XmlError::write)?;
        return Ok(());
    }
    writer
        .write_event(Event::Start(start))
        .map_err(XmlError::write)?;
    for node in element.children() {
        match node {
            Node::Element(child) => write_element(writer, child)?,
            Node::Text(text) => writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(XmlError::write)?,
            Node::CData(text) => writer
                .write_event(Event::CData(BytesCData::new(text.as_str())))
                .map_err(XmlError::write)?,
            Node::Comment(text) => writer
                .write_event(Event::Comment(BytesText::from_escaped(text.as_str())))
                .map_err(XmlError::write)?,
        }
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.name())))
        .map_err(XmlError::write)?;
    Ok(())
}
