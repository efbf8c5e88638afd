use std::path::{Path, PathBuf};

use tdd_schema::{SchemaIndex, SchemaResolver, Settings, TemplateRegistry};
use tdd_transform::{
    NamespaceStyle, OPENEHR_NS, TemplateInstance, TransformEngine, TransformError, TransformOptions,
};
use tdd_xml::{Document, Element};
use url::Url;

const TEMPLATE_ID: &str = "vitals.t1";
const ORIGIN: &str = "2024-01-15T10:00:00.000";

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn settings(cache: &Path) -> Settings {
    Settings::default()
        .with_cache_folder(cache)
        .with_template_folder(fixture(""))
        .with_template(TEMPLATE_ID, "vitals.xsd")
}

fn instance() -> TemplateInstance {
    TemplateInstance::from_path(&fixture("encounter.xml")).expect("parse instance")
}

fn engine() -> TransformEngine {
    TransformEngine::standard(TransformOptions::default().with_origin_time(ORIGIN))
}

fn shipped_schema() -> SchemaIndex {
    SchemaIndex::from_path(&fixture("vitals.xsd")).expect("parse schema")
}

fn local_names(element: &Element) -> Vec<&str> {
    element.child_elements().map(Element::local_name).collect()
}

fn child<'a>(element: &'a Element, path: &[&str]) -> &'a Element {
    path.iter().fold(element, |current, name| {
        current
            .child(name)
            .unwrap_or_else(|| panic!("missing child {name} under {}", current.name()))
    })
}

fn transformed() -> Document {
    let schema = shipped_schema();
    schema.load();
    engine()
        .transform_with_schema(&instance(), &schema)
        .expect("transform")
}

#[test]
fn root_becomes_an_rm_composition() {
    let output = transformed();
    let root = &output.root;

    assert_eq!(root.name(), "oe:composition");
    assert_eq!(root.attribute("template_id"), None);
    assert_eq!(root.attribute("xmlns"), None);
    assert_eq!(root.attribute("xmlns:oe"), Some(OPENEHR_NS));
    assert_eq!(
        root.attribute("xsi:schemaLocation"),
        Some("http://schemas.openehr.org/v1 https://specifications.openehr.org/releases/1.0.2/its/XML-schema/Composition.xsd")
    );
    assert_eq!(root.attribute("archetype_node_id"), Some("openEHR-EHR-COMPOSITION.encounter.v1"));
    assert_eq!(root.attribute("xsi:type"), Some("oe:COMPOSITION"));
    assert_eq!(
        local_names(root),
        vec![
            "name",
            "archetype_details",
            "language",
            "territory",
            "category",
            "composer",
            "context",
            "content"
        ]
    );
    assert!(root.child_elements().all(|child| child.name().starts_with("oe:")));

    let details = child(root, &["archetype_details"]);
    assert_eq!(
        child(details, &["archetype_id", "value"]).text(),
        "openEHR-EHR-COMPOSITION.encounter.v1"
    );
    assert_eq!(child(details, &["template_id", "value"]).text(), TEMPLATE_ID);
    assert_eq!(child(details, &["rm_version"]).text(), "1.0.2");
}

#[test]
fn non_locatable_subtrees_are_copied_untouched() {
    let output = transformed();
    let composer = child(&output.root, &["composer"]);
    assert_eq!(composer.attribute("xsi:type"), Some("oe:PARTY_IDENTIFIED"));
    assert_eq!(composer.attribute("archetype_node_id"), None);
    assert_eq!(child(composer, &["name"]).text(), "Dr. Jones & team");
}

#[test]
fn observation_gains_history_and_origin() {
    let output = transformed();
    let observation = child(&output.root, &["content"]);
    assert_eq!(observation.attribute("xsi:type"), Some("oe:OBSERVATION"));
    assert_eq!(
        local_names(observation),
        vec!["name", "archetype_details", "language", "encoding", "subject", "data"]
    );

    let history = child(observation, &["data"]);
    assert_eq!(history.attribute("archetype_node_id"), Some("at0001"));
    assert_eq!(history.attribute("xsi:type"), Some("oe:HISTORY"));
    assert_eq!(local_names(history), vec!["name", "origin", "events", "events"]);
    assert_eq!(child(history, &["name", "value"]).text(), "HISTORY");
    assert_eq!(child(history, &["origin", "value"]).text(), ORIGIN);
}

#[test]
fn point_events_drop_only_empty_state() {
    let output = transformed();
    let history = child(&output.root, &["content", "data"]);
    let events: Vec<&Element> = history
        .child_elements()
        .filter(|child| child.local_name() == "events")
        .collect();
    assert_eq!(events.len(), 2);

    for event in &events {
        assert_eq!(event.attribute("xsi:type"), Some("oe:POINT_EVENT"));
        assert_eq!(child(event, &["name", "value"]).text(), "ANY_EVENT");
    }
    assert_eq!(local_names(events[0]), vec!["name", "time", "data"]);
    assert_eq!(local_names(events[1]), vec!["name", "time", "data", "state"]);
}

#[test]
fn elements_are_typed_and_reordered() {
    let output = transformed();
    let tree = child(&output.root, &["content", "data", "events", "data"]);
    assert_eq!(tree.attribute("xsi:type"), Some("oe:ITEM_TREE"));
    assert_eq!(local_names(tree), vec!["name", "items", "items"]);

    let systolic = tree.nth_element(1).expect("systolic");
    assert_eq!(systolic.attribute("archetype_node_id"), Some("at0004"));
    assert_eq!(systolic.attribute("xsi:type"), Some("oe:ELEMENT"));
    assert_eq!(local_names(child(systolic, &["name"])), vec!["value"]);
    let quantity = child(systolic, &["value"]);
    assert_eq!(quantity.attribute("xsi:type"), Some("oe:DV_QUANTITY"));
    assert_eq!(local_names(quantity), vec!["magnitude", "units", "precision"]);

    let position = tree.nth_element(2).expect("position");
    let proportion = child(position, &["value"]);
    assert_eq!(proportion.attribute("xsi:type"), Some("oe:DV_PROPORTION"));
    assert_eq!(local_names(proportion), vec!["numerator", "denominator", "type"]);
    assert_eq!(child(proportion, &["denominator"]).text(), "100");
}

#[test]
fn source_instance_is_not_modified() {
    let instance = instance();
    let before = instance.document().clone();
    let schema = shipped_schema();
    engine()
        .transform_with_schema(&instance, &schema)
        .expect("transform");
    assert_eq!(instance.document(), &before);
    assert_eq!(instance.root().name(), "Encounter");
}

#[test]
fn canonical_style_uses_default_namespace() {
    let schema = shipped_schema();
    let engine = TransformEngine::standard(TransformOptions::canonical().with_origin_time(ORIGIN));
    let output = engine
        .transform_with_schema(&instance(), &schema)
        .expect("transform");
    let root = &output.root;

    assert_eq!(engine.options().namespace_style, NamespaceStyle::Default);
    assert_eq!(engine.registry().len(), 14);
    assert_eq!(root.name(), "composition");
    assert_eq!(root.attribute("xmlns"), Some(OPENEHR_NS));
    assert_eq!(root.attribute("xmlns:oe"), None);
    assert_eq!(root.attribute("xsi:type"), Some("COMPOSITION"));
    let history = child(root, &["content", "data"]);
    assert_eq!(history.name(), "data");
    assert_eq!(history.attribute("xsi:type"), Some("HISTORY"));
}

#[test]
fn unregistered_types_fail_the_transform() {
    let source = std::fs::read_to_string(fixture("vitals.xsd"))
        .expect("read schema")
        .replace(r#"fixed="ITEM_TREE""#, r#"fixed="GENERIC_ENTRY""#);
    let schema = SchemaIndex::parse_str(&source, "generic.xsd").expect("parse schema");

    match engine().transform_with_schema(&instance(), &schema) {
        Err(TransformError::UnsupportedType { rm_type }) => assert_eq!(rm_type, "GENERIC_ENTRY"),
        other => panic!("expected unsupported type, got {other:?}"),
    }
}

#[test]
fn output_does_not_depend_on_cache_warmth() {
    let cold = shipped_schema();
    let warm = shipped_schema();
    warm.load();
    let engine = engine();
    let instance = instance();

    let from_cold = engine
        .transform_with_schema(&instance, &cold)
        .expect("cold")
        .to_xml_string()
        .expect("serialize");
    let from_warm = engine
        .transform_with_schema(&instance, &warm)
        .expect("warm")
        .to_xml_string()
        .expect("serialize");
    assert_eq!(from_cold, from_warm);

    let cache = tempfile::tempdir().expect("tempdir");
    let first = TemplateRegistry::new(settings(cache.path()));
    let from_shipped = engine
        .transform(&instance, &first)
        .expect("shipped")
        .to_xml_string()
        .expect("serialize");
    assert!(first.store().exists(TEMPLATE_ID));

    let second = TemplateRegistry::new(settings(cache.path()));
    let from_disk = engine
        .transform(&instance, &second)
        .expect("disk cache")
        .to_xml_string()
        .expect("serialize");

    assert!(first.store().remove(TEMPLATE_ID).expect("remove cache"));
    let third = TemplateRegistry::new(settings(cache.path()));
    let after_removal = engine
        .transform(&instance, &third)
        .expect("rebuilt")
        .to_xml_string()
        .expect("serialize");

    assert_eq!(from_shipped, from_warm);
    assert_eq!(from_disk, from_warm);
    assert_eq!(after_removal, from_warm);
}

#[test]
fn schema_location_is_used_when_template_id_is_absent() {
    let location = Url::from_file_path(fixture("vitals.xsd"))
        .expect("file url")
        .to_string();
    let source = std::fs::read_to_string(fixture("encounter.xml"))
        .expect("read instance")
        .replace(r#"template_id="vitals.t1""#, "")
        .replace("templates vitals.xsd", &format!("templates {location}"));
    let instance = TemplateInstance::parse_str(&source).expect("parse instance");
    assert_eq!(instance.template_id(), None);
    assert_eq!(instance.schema_location(), Some(location.as_str()));

    let cache = tempfile::tempdir().expect("tempdir");
    let registry = TemplateRegistry::new(Settings::default().with_cache_folder(cache.path()));
    let output = engine().transform(&instance, &registry).expect("transform");
    registry.join_background();

    let details = child(&output.root, &["archetype_details"]);
    assert_eq!(child(details, &["template_id", "value"]).text(), TEMPLATE_ID);
    assert!(registry.store().exists(TEMPLATE_ID));
    assert_eq!(output, transformed());
}

#[test]
fn unresolvable_schema_is_reported() {
    let source = std::fs::read_to_string(fixture("encounter.xml"))
        .expect("read instance")
        .replace("vitals.t1", "unknown.t1")
        .replace("templates vitals.xsd", "templates not a url");
    let instance = TemplateInstance::parse_str(&source).expect("parse instance");
    let cache = tempfile::tempdir().expect("tempdir");
    let registry = TemplateRegistry::new(Settings::default().with_cache_folder(cache.path()));

    assert!(registry.resolve_by_template_id("unknown.t1").is_none());
    match engine().transform(&instance, &registry) {
        Err(TransformError::SchemaUnresolved { template_id, .. }) => assert_eq!(template_id, "unknown.t1"),
        other => panic!("expected unresolved schema, got {other:?}"),
    }
}
