//! Command implementations. Printing is left to `main`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{ContentArrangement, Table};
use tdd_schema::path::signature_names;
use tdd_schema::{CacheStore, ElementMetadata, SchemaIndex, Settings, TemplateRegistry};
use tdd_transform::{TemplateInstance, TransformEngine, TransformOptions};
use tracing::{info, info_span};

/// Result of `tdd2rm transform`.
#[derive(Debug)]
pub struct TransformOutcome {
    pub root: String,
    /// Serialized composition.
    pub xml: String,
    /// Where the composition was written, when not to stdout.
    pub output: Option<PathBuf>,
}

pub fn run_transform(
    settings: Settings,
    input: &Path,
    output: Option<&Path>,
    options: TransformOptions,
) -> Result<TransformOutcome> {
    let span = info_span!("transform", input = %input.display());
    let _guard = span.enter();
    let start = Instant::now();

    let instance = TemplateInstance::from_path(input)
        .with_context(|| format!("read instance {}", input.display()))?;
    let registry = TemplateRegistry::new(settings);
    let engine = TransformEngine::standard(options);
    let transformed = engine.transform(&instance, &registry);
    // Let cache population started during resolution finish before exit.
    registry.join_background();
    let document = transformed.with_context(|| format!("transform {}", input.display()))?;

    let xml = document.to_xml_string().context("serialize composition")?;
    if let Some(path) = output {
        document
            .write_to_path(path)
            .with_context(|| format!("write {}", path.display()))?;
    }
    info!(
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Transformed {}",
        input.display()
    );
    Ok(TransformOutcome {
        root: document.root.name().to_string(),
        xml,
        output: output.map(Path::to_path_buf),
    })
}

/// Result of `tdd2rm index`.
#[derive(Debug)]
pub struct IndexReport {
    pub template_id: Option<String>,
    /// Fixed-attribute entries recorded.
    pub entries: usize,
    pub definitions: BTreeMap<String, ElementMetadata>,
    pub saved_to: Option<PathBuf>,
}

impl IndexReport {
    pub fn locatable(&self) -> impl Iterator<Item = (&String, &ElementMetadata)> {
        self.definitions
            .iter()
            .filter(|(_, metadata)| metadata.is_locatable())
    }
}

pub fn run_index(settings: &Settings, schema: &Path, save: bool) -> Result<IndexReport> {
    let index = SchemaIndex::from_path(schema)
        .with_context(|| format!("read schema {}", schema.display()))?;
    let entries = index.load();
    let saved_to = if save {
        let store = CacheStore::new(settings.cache_dir());
        let path = store
            .save(&index)
            .with_context(|| format!("persist index for {}", schema.display()))?;
        Some(path)
    } else {
        None
    };
    Ok(IndexReport {
        template_id: index.template_id(),
        entries,
        definitions: index.definitions(),
        saved_to,
    })
}

/// Table of the locatable definitions in a report.
pub fn index_table(report: &IndexReport) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Path", "Node id", "RM type", "Value type"]);
    apply_table_style(&mut table);
    for (signature, metadata) in report.locatable() {
        table.add_row(vec![
            display_path(signature),
            metadata.archetype_node_id.clone().unwrap_or_default(),
            metadata.rm_type.clone().unwrap_or_default(),
            metadata.value_type.clone().unwrap_or_default(),
        ]);
    }
    table
}

/// Remove the cached index for `template_id`. Returns whether one existed.
pub fn run_cache_clear(settings: &Settings, template_id: &str) -> Result<bool> {
    let store = CacheStore::new(settings.cache_dir());
    store
        .remove(template_id)
        .with_context(|| format!("remove cache for {template_id}"))
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn display_path(signature: &str) -> String {
    format!("/{}", signature_names(signature).join("/"))
}
