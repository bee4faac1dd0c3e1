use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::classify::DEFAULT_PATTERN;
use crate::policy::{DEFAULT_ARCHIVE_AFTER_MONTHS, DEFAULT_RETAIN_COUNT};
use crate::{Error, Result};

const DEFAULT_BASE_DIR: &str = "../logs";

/// Settings for a maintenance run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaintenanceConfig {
    /// Log root; see [`crate::layout::LogLayout`].
    pub base_dir: PathBuf,
    /// Files kept per bucket.
    pub retain_count: usize,
    /// Age in calendar months after which dated directories are archived.
    pub archive_after_months: u32,
    /// Wildcard selecting candidate files in the standard log directories.
    pub log_pattern: String,
    /// Hold an advisory lock on `<base>/core/.logkeeper.lock` while running.
    pub lock: bool,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from(DEFAULT_BASE_DIR),
            retain_count: DEFAULT_RETAIN_COUNT,
            archive_after_months: DEFAULT_ARCHIVE_AFTER_MONTHS,
            log_pattern: DEFAULT_PATTERN.to_string(),
            lock: true,
        }
    }
}

impl MaintenanceConfig {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            ..Default::default()
        }
    }

    /// Load a JSON config file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.retain_count == 0 {
            return Err(Error::Config("retain_count must be at least 1".to_string()));
        }
        if self.log_pattern.is_empty() {
            return Err(Error::Config("log_pattern must not be empty".to_string()));
        }
        Ok(())
    }
}
