use tdd_xml::{Document, Element, XmlError};

const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Encounter xmlns="http://schemas.oceanehr.com/templates" template_id="t1">
  <name>
    <value>Blood &amp; pressure</value>
  </name>
  <context/>
</Encounter>
"#;

#[test]
fn serialized_output_reparses_to_the_same_tree() {
    let document = Document::parse_str(SAMPLE).expect("parse sample");
    let xml = document.to_xml_string().expect("serialize");

    assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
    assert!(xml.contains("<value>Blood &amp; pressure</value>"));
    assert!(xml.contains("<context/>"));

    let reparsed = Document::parse_str(&xml).expect("reparse");
    assert_eq!(reparsed, document);
}

#[test]
fn edits_show_up_in_serialized_output() {
    let mut document = Document::parse_str(SAMPLE).expect("parse sample");
    document.root.set_name("oe:composition");
    document.root.remove_attribute("template_id");
    document
        .root
        .insert_element(1, Element::new("archetype_details").with_child(Element::with_text("rm_version", "1.0.2")));

    let xml = document.to_xml_string().expect("serialize");
    assert!(xml.contains("<oe:composition"));
    assert!(!xml.contains("template_id"));
    let details = xml.find("archetype_details").expect("details written");
    let context = xml.find("<context/>").expect("context written");
    assert!(details < context);
}

#[test]
fn write_to_path_creates_parent_directories() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("out").join("composition.xml");
    let document = Document::parse_str(SAMPLE).expect("parse sample");

    document.write_to_path(&path).expect("write");

    let loaded = Document::from_path(&path).expect("read back");
    assert_eq!(loaded, document);
    assert!(!path.with_extension("xml.tmp").exists());
}

#[test]
fn missing_file_reports_the_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("absent.xml");
    match Document::from_path(&path) {
        Err(XmlError::Io { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected io error, got {other:?}"),
    }
}
