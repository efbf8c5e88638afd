//! Template registry: find the schema index for a template.
//!
//! Resolution by template id tries, in order:
//!
//! | Step | Source | On success |
//! |------|--------|------------|
//! | 1 | in-process table | returned as is |
//! | 2 | disk cache (`CACHE_FOLDER`) | kept in the table |
//! | 3 | shipped schema (`TEMPLATE_FOLDER` + configured file name) | loaded synchronously, persisted, kept in the table |
//!
//! Resolution by location fetches the schema, derives its template id, and
//! prefers an existing disk cache for that id. Otherwise the freshly fetched
//! index is returned at once while a background thread loads it fully and
//! persists it. Lookups made before that thread finishes evaluate paths
//! against the schema tree instead.
//!
//! Every miss is logged and reported as `None`; the caller decides whether an
//! unresolved schema is fatal.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::thread::JoinHandle;

use tracing::{debug, info, warn};

use crate::cache::CacheStore;
use crate::config::Settings;
use crate::fetch::{fetch_schema, parse_location};
use crate::index::SchemaIndex;

/// Source of schema indexes for the transform engine.
pub trait SchemaResolver: Send + Sync {
    fn resolve_by_template_id(&self, template_id: &str) -> Option<Arc<SchemaIndex>>;

    fn resolve_by_location(&self, location: &str) -> Option<Arc<SchemaIndex>>;
}

pub struct TemplateRegistry {
    settings: Settings,
    store: CacheStore,
    templates: RwLock<HashMap<String, Arc<SchemaIndex>>>,
    background: Mutex<Vec<JoinHandle<()>>>,
}

impl TemplateRegistry {
    pub fn new(settings: Settings) -> Self {
        let store = CacheStore::new(settings.cache_dir());
        Self {
            settings,
            store,
            templates: RwLock::new(HashMap::new()),
            background: Mutex::new(Vec::new()),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Template ids currently held in memory.
    pub fn cached_template_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .templates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }

    /// Wait for background cache population started by this registry.
    ///
    /// Transforms never need this; a short-lived process calls it before
    /// exiting so pending cache files get written.
    pub fn join_background(&self) {
        let handles: Vec<JoinHandle<()>> = self
            .background
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        for handle in handles {
            if handle.join().is_err() {
                warn!("Background schema index task panicked");
            }
        }
    }

    fn in_memory(&self, template_id: &str) -> Option<Arc<SchemaIndex>> {
        self.templates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(template_id)
            .cloned()
    }

    /// Publish an index, keeping whichever instance got there first.
    fn publish(&self, template_id: &str, index: Arc<SchemaIndex>) -> Arc<SchemaIndex> {
        let mut templates = self.templates.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            templates
                .entry(template_id.to_string())
                .or_insert(index),
        )
    }

    fn from_shipped_schema(&self, template_id: &str) -> Option<SchemaIndex> {
        let Some(path) = self.settings.template_file(template_id) else {
            debug!(template_id, "No shipped schema configured");
            return None;
        };
        let index = match SchemaIndex::from_path(&path) {
            Ok(index) => index,
            Err(error) => {
                warn!(template_id, %error, "Failed to open shipped schema");
                return None;
            }
        };
        let entries = index.load();
        info!(template_id, entries, "Indexed shipped schema {}", path.display());
        if let Err(error) = self.store.save(&index) {
            warn!(template_id, %error, "Failed to persist schema index");
        }
        Some(index)
    }

    fn spawn_prewarm(&self, template_id: &str, index: &Arc<SchemaIndex>) {
        let index = Arc::clone(index);
        let store = self.store.clone();
        let template_id = template_id.to_string();
        let handle = std::thread::spawn(move || {
            let entries = index.load();
            debug!(template_id = %template_id, entries, "Background schema index ready");
            if let Err(error) = store.save(&index) {
                warn!(template_id = %template_id, %error, "Failed to persist schema index");
            }
        });
        self.background
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(handle);
    }
}

impl SchemaResolver for TemplateRegistry {
    fn resolve_by_template_id(&self, template_id: &str) -> Option<Arc<SchemaIndex>> {
        if let Some(index) = self.in_memory(template_id) {
            return Some(index);
        }
        if let Some(index) = self.store.load(template_id) {
            return Some(self.publish(template_id, Arc::new(index)));
        }
        let index = self.from_shipped_schema(template_id)?;
        Some(self.publish(template_id, Arc::new(index)))
    }

    fn resolve_by_location(&self, location: &str) -> Option<Arc<SchemaIndex>> {
        let url = match parse_location(location) {
            Ok(url) => url,
            Err(error) => {
                warn!(%error, "Ignoring malformed schema location");
                return None;
            }
        };
        let source = match fetch_schema(&url) {
            Ok(source) => source,
            Err(error) => {
                warn!(%error, "Failed to fetch schema");
                return None;
            }
        };
        let fresh = match SchemaIndex::parse_str(&source, url.as_str()) {
            Ok(index) => index,
            Err(error) => {
                warn!(%error, "Fetched schema is not valid XML");
                return None;
            }
        };
        let Some(template_id) = fresh.template_id() else {
            warn!(%url, "Fetched schema declares no template id; it will not be cached");
            return Some(Arc::new(fresh));
        };

        if let Some(index) = self.in_memory(&template_id) {
            return Some(index);
        }
        if let Some(cached) = self.store.load(&template_id) {
            return Some(self.publish(&template_id, Arc::new(cached)));
        }

        let fresh = Arc::new(fresh);
        let published = self.publish(&template_id, Arc::clone(&fresh));
        if Arc::ptr_eq(&published, &fresh) {
            info!(template_id = %template_id, "Populating schema index cache in the background");
            self.spawn_prewarm(&template_id, &fresh);
        }
        Some(published)
    }
}
