//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into the engine. Services
//! never read environment variables while handling a request.

use crate::constants::DEFAULT_DATA_DIR;
use crate::{CareError, CareResult};
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`CareError::InvalidConfig`] if `data_dir` is empty or exists but is not a
    /// directory.
    pub fn new(data_dir: PathBuf) -> CareResult<Self> {
        if data_dir.as_os_str().is_empty() {
            return Err(CareError::InvalidConfig("data_dir cannot be empty".into()));
        }

        if data_dir.exists() && !data_dir.is_dir() {
            return Err(CareError::InvalidConfig(format!(
                "data_dir is not a directory: {}",
                data_dir.display()
            )));
        }

        Ok(Self { data_dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Directory holding one named collection of records.
    pub fn collection_dir(&self, collection: &str) -> PathBuf {
        self.data_dir.join(collection)
    }
}

/// Resolve the data directory from an optional environment value.
///
/// `None` or a blank value falls back to [`DEFAULT_DATA_DIR`].
pub fn data_dir_from_env_value(value: Option<String>) -> PathBuf {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}
