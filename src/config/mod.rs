//! Configuration management.
//!
//! Everything the tracker writes lives next to the primary database file:
//!
//! - **Cache**: `<db dir>/cache/` holds the JSONL export (versioned in git)
//! - **Annotations**: `<db dir>/annotations.db` holds pending history notes
//!
//! Both names can be overridden through the environment
//! (`CT_CACHE_DIR_NAME`, `CT_ANNOTATIONS_DB`) or the CLI.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Default name of the cache directory.
pub const DEFAULT_CACHE_DIR_NAME: &str = "cache";

/// Default file name of the annotation database.
pub const DEFAULT_ANNOTATIONS_FILE: &str = "annotations.db";

/// Cache directory for a database: a sibling directory `name` next to the file.
#[must_use]
pub fn cache_folder_path(database_path: &Path, name: &str) -> PathBuf {
    database_path
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(name)
}

/// Resolved tracker configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Name of the cache directory created next to the database file.
    pub cache_dir_name: String,
    /// Explicit annotation database; defaults to a sibling of the database file.
    pub annotations_db: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_dir_name: DEFAULT_CACHE_DIR_NAME.to_string(),
            annotations_db: None,
        }
    }
}

impl Config {
    /// Load configuration from the environment, falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if `CT_CACHE_DIR_NAME` is not a plain directory name.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(name) = std::env::var("CT_CACHE_DIR_NAME") {
            config = config.with_cache_dir_name(&name)?;
        }
        if let Ok(path) = std::env::var("CT_ANNOTATIONS_DB") {
            if !path.is_empty() {
                config.annotations_db = Some(PathBuf::from(path));
            }
        }
        Ok(config)
    }

    /// Override the cache directory name.
    ///
    /// # Errors
    ///
    /// Returns an error if `name` is empty or contains a path separator.
    pub fn with_cache_dir_name(mut self, name: &str) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(Error::Config(format!(
                "cache directory name must be a plain name, got '{name}'"
            )));
        }
        self.cache_dir_name = name.to_string();
        Ok(self)
    }

    /// Cache directory for `database_path`.
    #[must_use]
    pub fn cache_dir(&self, database_path: &Path) -> PathBuf {
        cache_folder_path(database_path, &self.cache_dir_name)
    }

    /// Annotation database for `database_path`.
    #[must_use]
    pub fn annotations_path(&self, database_path: &Path) -> PathBuf {
        self.annotations_db.clone().unwrap_or_else(|| {
            database_path
                .parent()
                .unwrap_or_else(|| Path::new(""))
                .join(DEFAULT_ANNOTATIONS_FILE)
        })
    }
}
