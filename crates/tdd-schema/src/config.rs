//! Registry configuration.
//!
//! A flat TOML key/value file:
//!
//! ```toml
//! CACHE_FOLDER = ".tdd2rm-cache"
//! TEMPLATE_FOLDER = "templates"
//! "Vital signs.t1" = "vital_signs.xsd"
//! ```
//!
//! Every key other than the two folder settings maps a template id to the
//! file name of its shipped schema inside `TEMPLATE_FOLDER`. Relative folders
//! are resolved against the directory holding the configuration file.
//!
//! Resolution order for the file itself:
//! 1. an explicit path (the CLI `--config` flag)
//! 2. the `TDD2RM_CONFIG` environment variable
//! 3. `tdd2rm.toml` in the working directory

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Result, SchemaError};

/// Environment variable overriding the configuration file location.
pub const CONFIG_ENV_VAR: &str = "TDD2RM_CONFIG";

/// Configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "tdd2rm.toml";

pub const DEFAULT_CACHE_FOLDER: &str = ".tdd2rm-cache";
pub const DEFAULT_TEMPLATE_FOLDER: &str = "templates";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(rename = "CACHE_FOLDER", default, skip_serializing_if = "Option::is_none")]
    pub cache_folder: Option<PathBuf>,

    #[serde(rename = "TEMPLATE_FOLDER", default, skip_serializing_if = "Option::is_none")]
    pub template_folder: Option<PathBuf>,

    /// Template id → schema file name.
    #[serde(flatten)]
    pub templates: BTreeMap<String, String>,

    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

impl Settings {
    /// Locate and load the configuration file.
    ///
    /// A missing file yields defaults; a file that exists but does not parse
    /// is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => std::env::var_os(CONFIG_ENV_VAR)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE)),
        };
        match Self::load_from(&path) {
            Err(error) if error.is_not_found() && explicit.is_none() => {
                info!("No configuration found at {}, using defaults", path.display());
                Ok(Self::default())
            }
            other => other,
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| SchemaError::io("read", path, e))?;
        let mut settings: Settings = toml::from_str(&content).map_err(|source| SchemaError::Config {
            path: path.to_path_buf(),
            source,
        })?;
        settings.base_dir = path.parent().map(Path::to_path_buf);
        info!(
            templates = settings.templates.len(),
            "Loaded configuration from {}",
            path.display()
        );
        Ok(settings)
    }

    #[must_use]
    pub fn with_cache_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.cache_folder = Some(folder.into());
        self
    }

    #[must_use]
    pub fn with_template_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.template_folder = Some(folder.into());
        self
    }

    #[must_use]
    pub fn with_template(mut self, template_id: impl Into<String>, file_name: impl Into<String>) -> Self {
        self.templates.insert(template_id.into(), file_name.into());
        self
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.resolve(self.cache_folder.as_deref(), DEFAULT_CACHE_FOLDER)
    }

    pub fn template_dir(&self) -> PathBuf {
        self.resolve(self.template_folder.as_deref(), DEFAULT_TEMPLATE_FOLDER)
    }

    /// Shipped schema file for a template id, if one is configured.
    pub fn template_file(&self, template_id: &str) -> Option<PathBuf> {
        self.templates
            .get(template_id)
            .map(|file_name| self.template_dir().join(file_name))
    }

    fn resolve(&self, configured: Option<&Path>, default: &str) -> PathBuf {
        let folder = configured.unwrap_or_else(|| Path::new(default));
        match &self.base_dir {
            Some(base) if folder.is_relative() => base.join(folder),
            _ => folder.to_path_buf(),
        }
    }
}
