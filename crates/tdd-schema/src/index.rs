//! Schema index: fixed-attribute metadata keyed by path signature.
//!
//! An index is built from a parsed TDS. [`SchemaIndex::load`] walks every
//! element definition once and records the three fixed attributes for its
//! path. [`SchemaIndex::lookup`] answers from that table and falls back to
//! evaluating the path against the schema tree when the key has not been
//! recorded yet, for example while a background load is still running.
//!
//! An index restored from the disk cache has no schema tree; its table is
//! complete by construction and a miss is simply absent.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{OnceLock, PoisonError, RwLock};

use tdd_xml::{Document, Element};
use tracing::{debug, trace, warn};

use crate::error::{Result, SchemaError};
use crate::path::{FixedAttribute, SchemaPath};

/// Metadata of one schema element definition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementMetadata {
    pub archetype_node_id: Option<String>,
    pub rm_type: Option<String>,
    pub value_type: Option<String>,
}

impl ElementMetadata {
    pub fn is_locatable(&self) -> bool {
        self.archetype_node_id.is_some()
    }
}

#[derive(Debug)]
pub struct SchemaIndex {
    schema: Option<Element>,
    entries: RwLock<HashMap<String, Option<String>>>,
    template_id: OnceLock<Option<String>>,
    loaded: AtomicBool,
}

impl SchemaIndex {
    /// Index over a parsed schema document. The table starts empty.
    pub fn from_document(document: Document) -> Self {
        Self {
            schema: Some(document.root),
            entries: RwLock::new(HashMap::new()),
            template_id: OnceLock::new(),
            loaded: AtomicBool::new(false),
        }
    }

    pub fn parse_str(source: &str, location: &str) -> Result<Self> {
        let document = Document::parse_str(source).map_err(|source| SchemaError::Xml {
            location: location.to_string(),
            source,
        })?;
        Ok(Self::from_document(document))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let source =
            std::fs::read_to_string(path).map_err(|e| SchemaError::io("read", path, e))?;
        Self::parse_str(&source, &path.display().to_string())
    }

    /// Index restored from a persisted table, without a schema tree.
    pub fn from_entries(template_id: Option<String>, entries: BTreeMap<String, Option<String>>) -> Self {
        Self {
            schema: None,
            entries: RwLock::new(entries.into_iter().collect()),
            template_id: OnceLock::from(template_id),
            loaded: AtomicBool::new(true),
        }
    }

    /// Walk every element definition and record its fixed attributes.
    ///
    /// Entries are published one definition at a time, so concurrent lookups
    /// see a growing table. Loading twice produces the same table. Returns the
    /// number of entries after loading.
    pub fn load(&self) -> usize {
        let Some(schema) = &self.schema else {
            return self.len();
        };
        match top_element(schema) {
            Some(top) => self.record_subtree(top, &SchemaPath::root(), Some(top)),
            None => warn!("Schema has no top-level element definition"),
        }
        self.loaded.store(true, Ordering::Release);
        let count = self.len();
        debug!(entries = count, "Schema index loaded");
        count
    }

    /// Postorder over schema nodes. `resolved` is the definition the path
    /// signature actually selects, which differs from `node` when the same
    /// name occurs more than once below an ancestor.
    fn record_subtree(&self, node: &Element, path: &SchemaPath, resolved: Option<&Element>) {
        for child in node.child_elements() {
            match element_definition_name(child) {
                Some(name) => {
                    let child_path = path.child(name);
                    let child_resolved = resolved.and_then(|r| find_named_definition(r, name));
                    self.record_subtree(child, &child_path, child_resolved);
                }
                None => self.record_subtree(child, path, resolved),
            }
        }
        if node.local_name() != "element" {
            return;
        }
        let mut entries = self.write_entries();
        for attribute in FixedAttribute::ELEMENT {
            let value = resolved.and_then(|definition| fixed_value(definition, attribute));
            entries.insert(attribute.key(path), value);
        }
    }

    /// Fixed attribute value for the definition at `path`.
    ///
    /// Never fails: a key missing from the table is evaluated against the
    /// schema tree (and logged as a slow path), or is absent when there is no
    /// tree to evaluate against.
    pub fn lookup(&self, path: &SchemaPath, attribute: FixedAttribute) -> Option<String> {
        let key = attribute.key(path);
        if let Some(value) = self.read_entries().get(&key) {
            trace!(%key, "Schema index hit");
            return value.clone();
        }
        let Some(schema) = &self.schema else {
            trace!(%key, "Schema index miss without schema tree");
            return None;
        };
        warn!(%key, "Schema index miss, evaluating path against schema (slow)");
        query(schema, path, attribute)
    }

    pub fn metadata(&self, path: &SchemaPath) -> ElementMetadata {
        ElementMetadata {
            archetype_node_id: self.lookup(path, FixedAttribute::ArchetypeNodeId),
            rm_type: self.lookup(path, FixedAttribute::RmType),
            value_type: self.lookup(path, FixedAttribute::ValueType),
        }
    }

    /// Template id fixed on the top-level element, computed once.
    pub fn template_id(&self) -> Option<String> {
        self.template_id
            .get_or_init(|| {
                self.schema
                    .as_ref()
                    .and_then(|schema| query(schema, &SchemaPath::root(), FixedAttribute::TemplateId))
            })
            .clone()
    }

    /// Whether a full load has completed (always true for cached indexes).
    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    pub fn has_schema(&self) -> bool {
        self.schema.is_some()
    }

    pub fn len(&self) -> usize {
        self.read_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sorted snapshot of the table.
    pub fn entries(&self) -> BTreeMap<String, Option<String>> {
        self.read_entries()
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Recorded element definitions grouped by signature.
    pub fn definitions(&self) -> BTreeMap<String, ElementMetadata> {
        let mut definitions: BTreeMap<String, ElementMetadata> = BTreeMap::new();
        for (key, value) in self.read_entries().iter() {
            let Some((signature, attribute)) = FixedAttribute::split_key(key) else {
                continue;
            };
            let metadata = definitions.entry(signature.to_string()).or_default();
            match attribute {
                FixedAttribute::ArchetypeNodeId => metadata.archetype_node_id.clone_from(value),
                FixedAttribute::RmType => metadata.rm_type.clone_from(value),
                FixedAttribute::ValueType => metadata.value_type.clone_from(value),
                FixedAttribute::TemplateId => {}
            }
        }
        definitions
    }

    fn read_entries(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Option<String>>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_entries(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Option<String>>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// `/schema[1]/element[1]`
fn top_element(schema: &Element) -> Option<&Element> {
    if schema.local_name() != "schema" {
        return None;
    }
    schema
        .child_elements()
        .find(|child| child.local_name() == "element")
}

fn element_definition_name(node: &Element) -> Option<&str> {
    if node.local_name() == "element" {
        node.attribute("name")
    } else {
        None
    }
}

/// `(context//element[@name='name'])[1]`
fn find_named_definition<'a>(context: &'a Element, name: &str) -> Option<&'a Element> {
    context
        .descendants()
        .find(|candidate| element_definition_name(candidate) == Some(name))
}

/// `complexType[1]/attribute[@name='K'][1]/@fixed`
fn fixed_value(definition: &Element, attribute: FixedAttribute) -> Option<String> {
    definition
        .child_elements()
        .find(|child| child.local_name() == "complexType")?
        .child_elements()
        .find(|child| {
            child.local_name() == "attribute" && child.attribute("name") == Some(attribute.schema_name())
        })?
        .attribute("fixed")
        .map(str::to_string)
}

/// Evaluate a path signature and attribute suffix against a schema tree.
fn query(schema: &Element, path: &SchemaPath, attribute: FixedAttribute) -> Option<String> {
    let mut current = top_element(schema)?;
    for step in path.steps() {
        current = find_named_definition(current, step)?;
    }
    fixed_value(current, attribute)
}
