use std::ffi::OsString;
use std::path::{Path, PathBuf};

use time::{Date, Month};

use crate::{Error, Result};

pub const COMPRESSED_SUFFIX: &str = ".gz";
pub const BUNDLE_SUFFIX: &str = ".tar.gz";
pub const TMP_SUFFIX: &str = ".tmp";
pub const LOCK_FILE: &str = ".logkeeper.lock";

/// Directory layout of a service log tree rooted at `<base>`.
///
/// ```text
/// <base>/core/*.log                      rotated logs
/// <base>/core/out/*.log                  rotated stdout logs
/// <base>/core/operation_log/YYYY-MM-DD/  one directory per day
/// ```
#[derive(Debug, Clone)]
pub struct LogLayout {
    root: PathBuf,
}

impl LogLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn core_dir(&self) -> PathBuf {
        self.root.join("core")
    }

    pub fn out_dir(&self) -> PathBuf {
        self.core_dir().join("out")
    }

    /// Flat directories holding rotated `access-*`, `error-*` and dated logs.
    pub fn standard_dirs(&self) -> [PathBuf; 2] {
        [self.core_dir(), self.out_dir()]
    }

    pub fn operation_log_dir(&self) -> PathBuf {
        self.core_dir().join("operation_log")
    }

    pub fn lock_path(&self) -> PathBuf {
        self.core_dir().join(LOCK_FILE)
    }
}

/// `<path>.gz`, the compacted form of a single log file.
pub fn compressed_path(path: &Path) -> PathBuf {
    with_suffix(path, COMPRESSED_SUFFIX)
}

/// `<dir>.tar.gz`, the archived form of a dated directory.
pub fn bundle_path(dir: &Path) -> PathBuf {
    with_suffix(dir, BUNDLE_SUFFIX)
}

pub fn tmp_path(path: &Path) -> PathBuf {
    with_suffix(path, TMP_SUFFIX)
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Parse a strict `YYYY-MM-DD` name into a calendar date.
pub fn parse_date(value: &str) -> Result<Date> {
    validate_date(value)?;
    let invalid = || Error::InvalidDate(value.to_string());
    let year = value[0..4].parse::<i32>().map_err(|_| invalid())?;
    let month = value[5..7].parse::<u8>().map_err(|_| invalid())?;
    let day = value[8..10].parse::<u8>().map_err(|_| invalid())?;
    let month = Month::try_from(month).map_err(|_| invalid())?;
    Date::from_calendar_date(year, month, day).map_err(|_| invalid())
}

/// Shape check only: four digits, hyphen, two digits, hyphen, two digits.
pub fn validate_date(value: &str) -> Result<()> {
    let bytes = value.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return Err(Error::InvalidDate(value.to_string()));
    }
    for (idx, byte) in bytes.iter().enumerate() {
        if idx == 4 || idx == 7 {
            continue;
        }
        if !byte.is_ascii_digit() {
            return Err(Error::InvalidDate(value.to_string()));
        }
    }
    Ok(())
}
