//! Grouping of rotated log files into retention buckets.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use glob::Pattern;
use log::error;

use crate::layout::validate_date;
use crate::stats::MaintenanceStats;
use crate::{Error, Result};

pub const DEFAULT_PATTERN: &str = "*.log";

/// Filename convention shared by the files of one retention unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Bucket {
    Access,
    Error,
    Date,
}

impl Bucket {
    /// Bucket for a file name, checked in priority order: `access-` prefix,
    /// `error-` prefix, then an exact `YYYY-MM-DD.log` name.
    pub fn for_file_name(name: &str) -> Option<Bucket> {
        if name.starts_with("access-") {
            return Some(Bucket::Access);
        }
        if name.starts_with("error-") {
            return Some(Bucket::Error);
        }
        let stem = name.strip_suffix(".log")?;
        validate_date(stem).ok().map(|_| Bucket::Date)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Bucket::Access => "access",
            Bucket::Error => "error",
            Bucket::Date => "date",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A rotated log file observed during a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFile {
    pub path: PathBuf,
    /// `None` when the file's metadata could not be read.
    pub modified: Option<SystemTime>,
}

impl LogFile {
    pub fn stat(path: PathBuf) -> Self {
        let modified = fs::metadata(&path).and_then(|meta| meta.modified()).ok();
        Self { path, modified }
    }
}

pub type Buckets = BTreeMap<Bucket, Vec<LogFile>>;

/// Group the files of `dir` matching `pattern` into buckets.
///
/// A scan failure (including a missing directory) is logged, recorded in
/// `stats` and yields no buckets.
pub fn classify(dir: &Path, pattern: &str, stats: &mut MaintenanceStats) -> Buckets {
    match scan_buckets(dir, pattern) {
        Ok(buckets) => buckets,
        Err(err) => {
            error!("Failed to scan log directory {}: {err}", dir.display());
            stats.record_error(format!("{}: {err}", dir.display()));
            Buckets::new()
        }
    }
}

/// Non-recursive scan of `dir`. Files that match the shell-style `pattern`
/// but no bucket convention are ignored.
pub fn scan_buckets(dir: &Path, pattern: &str) -> Result<Buckets> {
    let pattern = parse_pattern(pattern)?;
    let mut buckets = Buckets::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let name = match name.to_str() {
            Some(name) => name,
            None => continue,
        };
        if !pattern.matches(name) {
            continue;
        }
        if let Some(bucket) = Bucket::for_file_name(name) {
            buckets
                .entry(bucket)
                .or_default()
                .push(LogFile::stat(entry.path()));
        }
    }
    Ok(buckets)
}

fn parse_pattern(pattern: &str) -> Result<Pattern> {
    if pattern.is_empty() || pattern.contains('/') || pattern.contains('\\') {
        return Err(Error::InvalidPattern(pattern.to_string()));
    }
    Pattern::new(pattern).map_err(|err| Error::InvalidPattern(format!("{pattern}: {err}")))
}
