//! Count-based eviction and age-based compaction of one log bucket.

use std::cmp::Ordering;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::time::SystemTime;

use flate2::write::GzEncoder;
use flate2::Compression;
use log::{debug, error, info};

use crate::classify::{Bucket, LogFile};
use crate::layout::{compressed_path, tmp_path};
use crate::stats::MaintenanceStats;
use crate::Result;

/// Apply the retention window and compaction cutoff to one bucket.
///
/// The oldest `len - retain_count` files are deleted outright. Each
/// remaining file modified strictly before `compact_before` is replaced by
/// a `.gz` sibling. Failures are logged per file and never stop the pass.
pub fn reconcile(
    bucket: Bucket,
    mut files: Vec<LogFile>,
    retain_count: usize,
    compact_before: SystemTime,
    stats: &mut MaintenanceStats,
) {
    sort_by_modified(&mut files);

    let evict = files.len().saturating_sub(retain_count);
    for (idx, file) in files.iter().enumerate() {
        if idx < evict {
            info!(
                "Bucket {bucket} exceeds {retain_count} logs, deleting {}",
                file.path.display()
            );
            match fs::remove_file(&file.path) {
                Ok(()) => stats.record_deletion(),
                Err(err) => {
                    error!("Failed to delete log {}: {err}", file.path.display());
                    stats.record_error(format!("{}: {err}", file.path.display()));
                }
            }
            continue;
        }

        let meta = match fs::metadata(&file.path) {
            Ok(meta) => meta,
            Err(_) => continue,
        };
        let modified = match meta.modified() {
            Ok(modified) => modified,
            Err(_) => continue,
        };
        if modified >= compact_before {
            continue;
        }

        match compress_file(&file.path) {
            Ok(compressed_size) => {
                debug!("Compressed log {}", file.path.display());
                stats.record_compression(meta.len(), compressed_size);
            }
            Err(err) => {
                error!("Compression of file {} failed: {err}", file.path.display());
                stats.record_error(format!("{}: {err}", file.path.display()));
            }
        }
    }
}

/// Oldest first. Files whose mtime could not be read sort last.
pub fn sort_by_modified(files: &mut [LogFile]) {
    files.sort_by(|a, b| match (a.modified, b.modified) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

/// Replace `path` with a gzip-compressed `<path>.gz`.
///
/// The archive is written to `<path>.gz.tmp`, synced and renamed into place;
/// `path` is removed only after the rename. Returns the compressed size.
pub fn compress_file(path: &Path) -> Result<u64> {
    let gz_path = compressed_path(path);
    let gz_tmp = tmp_path(&gz_path);
    let _ = fs::remove_file(&gz_tmp);

    if let Err(err) = write_gzip(path, &gz_tmp) {
        let _ = fs::remove_file(&gz_tmp);
        return Err(err);
    }

    let compressed_size = fs::metadata(&gz_tmp)?.len();
    fs::rename(&gz_tmp, &gz_path)?;
    fs::remove_file(path)?;
    Ok(compressed_size)
}

fn write_gzip(src: &Path, dest: &Path) -> Result<()> {
    let mut input = File::open(src)?;
    let output = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(dest)?;

    let mut encoder = GzEncoder::new(output, Compression::default());
    io::copy(&mut input, &mut encoder)?;
    let mut output = encoder.finish()?;
    output.flush()?;
    output.sync_all()?;
    Ok(())
}
