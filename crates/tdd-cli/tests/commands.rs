use std::path::{Path, PathBuf};

use tdd_cli::commands::{index_table, run_cache_clear, run_index, run_transform};
use tdd_schema::Settings;
use tdd_transform::TransformOptions;
use tdd_xml::Document;

const TEMPLATE_ID: &str = "vitals.t1";
const ORIGIN: &str = "2024-01-15T10:00:00.000";

fn fixtures() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("tdd-transform")
        .join("tests")
        .join("fixtures")
}

fn settings(cache: &Path) -> Settings {
    Settings::default()
        .with_cache_folder(cache)
        .with_template_folder(fixtures())
        .with_template(TEMPLATE_ID, "vitals.xsd")
}

#[test]
fn transform_writes_the_composition() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cache = dir.path().join("cache");
    let output = dir.path().join("out").join("composition.xml");

    let outcome = run_transform(
        settings(&cache),
        &fixtures().join("encounter.xml"),
        Some(&output),
        TransformOptions::default().with_origin_time(ORIGIN),
    )
    .expect("transform");

    assert_eq!(outcome.root, "oe:composition");
    assert_eq!(outcome.output.as_deref(), Some(output.as_path()));
    let written = std::fs::read_to_string(&output).expect("read output");
    assert_eq!(written, outcome.xml);
    let document = Document::parse_str(&written).expect("reparse output");
    assert_eq!(document.root.name(), "oe:composition");
    assert!(written.contains(ORIGIN));
    assert!(cache.join("vitals.t1.json").exists());
}

#[test]
fn canonical_transform_to_stdout() {
    let dir = tempfile::tempdir().expect("tempdir");
    let outcome = run_transform(
        settings(dir.path()),
        &fixtures().join("encounter.xml"),
        None,
        TransformOptions::canonical().with_origin_time(ORIGIN),
    )
    .expect("transform");

    assert_eq!(outcome.root, "composition");
    assert!(outcome.output.is_none());
    assert!(outcome.xml.starts_with("<?xml"));
    assert!(!outcome.xml.contains("oe:"));
}

#[test]
fn transform_reports_missing_input() {
    let dir = tempfile::tempdir().expect("tempdir");
    let error = run_transform(
        settings(dir.path()),
        &dir.path().join("missing.xml"),
        None,
        TransformOptions::default(),
    )
    .expect_err("missing input");
    assert!(format!("{error:#}").contains("missing.xml"));
}

#[test]
fn index_lists_locatable_definitions_and_saves() {
    let dir = tempfile::tempdir().expect("tempdir");
    let settings = settings(dir.path());

    let report = run_index(&settings, &fixtures().join("vitals.xsd"), true).expect("index");
    assert_eq!(report.template_id.as_deref(), Some(TEMPLATE_ID));
    assert_eq!(report.entries, 72);
    assert_eq!(report.locatable().count(), 7);
    let saved = report.saved_to.as_deref().expect("saved");
    assert!(saved.exists());

    let table = index_table(&report).to_string();
    assert!(table.contains("/Vital_signs/data/Any_event"));
    assert!(table.contains("POINT_EVENT"));
    assert!(table.contains("DV_QUANTITY"));
}

#[test]
fn cache_clear_removes_only_existing_entries() {
    let dir = tempfile::tempdir().expect("tempdir");
    let settings = settings(dir.path());
    run_index(&settings, &fixtures().join("vitals.xsd"), true).expect("index");

    assert!(run_cache_clear(&settings, TEMPLATE_ID).expect("clear"));
    assert!(!run_cache_clear(&settings, TEMPLATE_ID).expect("clear again"));
}
