//! Persisted schema indexes, one JSON file per template id.
//!
//! Files carry a format tag and a version so a stale or foreign file is
//! rejected instead of misread. Writes go through a temp file and a rename;
//! several processes may write the same file, the last rename wins.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::error::{Result, SchemaError};
use crate::index::SchemaIndex;

/// Format tag written into every cache file.
pub const CACHE_FORMAT: &str = "tdd-schema-index";

/// Current cache file version.
pub const CACHE_VERSION: u32 = 1;

const CACHE_EXTENSION: &str = "json";

#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    format: String,
    version: u32,
    template_id: String,
    entries: BTreeMap<String, Option<String>>,
}

/// Directory of persisted schema indexes.
#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
}

impl CacheStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Cache file for a template id. Characters that cannot appear in a file
    /// name are replaced with `_`.
    pub fn path_for(&self, template_id: &str) -> PathBuf {
        let file_name: String = template_id
            .chars()
            .map(|c| match c {
                '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
                c if c.is_control() => '_',
                c => c,
            })
            .collect();
        self.dir.join(format!("{file_name}.{CACHE_EXTENSION}"))
    }

    pub fn exists(&self, template_id: &str) -> bool {
        self.path_for(template_id).is_file()
    }

    /// Read a cached index, reporting why it could not be used.
    pub fn read(&self, template_id: &str) -> Result<SchemaIndex> {
        let path = self.path_for(template_id);
        let bytes = fs::read(&path).map_err(|e| SchemaError::io("read", &path, e))?;
        let file: CacheFile =
            serde_json::from_slice(&bytes).map_err(|e| SchemaError::InvalidCache {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        if file.format != CACHE_FORMAT {
            return Err(SchemaError::InvalidCache {
                path,
                reason: format!("unexpected format tag '{}'", file.format),
            });
        }
        if file.version > CACHE_VERSION {
            return Err(SchemaError::UnsupportedCacheVersion {
                found: file.version,
                max_supported: CACHE_VERSION,
                path,
            });
        }
        if file.template_id != template_id {
            return Err(SchemaError::InvalidCache {
                path,
                reason: format!("file belongs to template '{}'", file.template_id),
            });
        }
        Ok(SchemaIndex::from_entries(Some(file.template_id), file.entries))
    }

    /// Cached index, or `None` when it is absent or unusable.
    pub fn load(&self, template_id: &str) -> Option<SchemaIndex> {
        match self.read(template_id) {
            Ok(index) => {
                info!(template_id, entries = index.len(), "Loaded schema index from cache");
                Some(index)
            }
            Err(error) if error.is_not_found() => {
                debug!(template_id, "No cached schema index");
                None
            }
            Err(error) => {
                warn!(template_id, %error, "Ignoring unusable schema index cache");
                None
            }
        }
    }

    /// Persist an index under its template id.
    pub fn save(&self, index: &SchemaIndex) -> Result<PathBuf> {
        let template_id = index.template_id().ok_or(SchemaError::MissingTemplateId)?;
        let file = CacheFile {
            format: CACHE_FORMAT.to_string(),
            version: CACHE_VERSION,
            template_id: template_id.clone(),
            entries: index.entries(),
        };
        let bytes = serde_json::to_vec_pretty(&file).map_err(SchemaError::Serialize)?;

        fs::create_dir_all(&self.dir).map_err(|e| SchemaError::io("create directory", &self.dir, e))?;
        let path = self.path_for(&template_id);
        // Each save gets its own temp file; concurrent saves of one template
        // only race on the final rename.
        let mut out = NamedTempFile::new_in(&self.dir)
            .map_err(|e| SchemaError::io("create temp file in", &self.dir, e))?;
        out.write_all(&bytes)
            .map_err(|e| SchemaError::io("write", out.path(), e))?;
        out.as_file()
            .sync_all()
            .map_err(|e| SchemaError::io("sync", out.path(), e))?;
        out.persist(&path)
            .map_err(|e| SchemaError::io("rename", &path, e.error))?;

        info!("Saved schema index for {} to {}", template_id, path.display());
        Ok(path)
    }

    /// Delete the cache file for a template id. Returns whether one existed.
    pub fn remove(&self, template_id: &str) -> Result<bool> {
        let path = self.path_for(template_id);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(SchemaError::io("remove", &path, e)),
        }
    }
}
