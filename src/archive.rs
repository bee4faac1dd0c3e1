//! Archival of dated operation-log directories into `.tar.gz` bundles.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;
use log::{debug, error};
use time::OffsetDateTime;
use walkdir::WalkDir;

use crate::layout::{bundle_path, parse_date, tmp_path};
use crate::stats::MaintenanceStats;
use crate::Result;

/// Bundle every `YYYY-MM-DD` subdirectory of `dir` whose midnight (in
/// `cutoff`'s offset) is strictly before `cutoff` into `<name>.tar.gz`, then
/// remove the subdirectory.
///
/// Any existing entry at the bundle path, even a dangling symlink, marks the
/// directory as done and it is skipped.
/// Entries that are not directories or not dated are ignored silently.
pub fn archive_dated_dirs(dir: &Path, cutoff: OffsetDateTime, stats: &mut MaintenanceStats) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            error!("Failed to scan operation log directory {}: {err}", dir.display());
            stats.record_error(format!("{}: {err}", dir.display()));
            return;
        }
    };

    let mut dated = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                error!("Failed to read entry in {}: {err}", dir.display());
                stats.record_error(format!("{}: {err}", dir.display()));
                continue;
            }
        };
        if !entry.file_type().map(|ty| ty.is_dir()).unwrap_or(false) {
            continue;
        }
        let date = match entry.file_name().to_str().map(parse_date) {
            Some(Ok(date)) => date,
            _ => continue,
        };
        if date.midnight().assume_offset(cutoff.offset()) < cutoff {
            dated.push((date, entry.path()));
        }
    }
    dated.sort();

    for (_, source) in dated {
        let target = bundle_path(&source);
        if fs::symlink_metadata(&target).is_ok() {
            debug!("Bundle {} already exists; skipped.", target.display());
            continue;
        }

        if let Err(err) = bundle_dir(&source, &target) {
            error!(
                "Compression of operation log directory {} failed: {err}",
                source.display()
            );
            stats.record_error(format!("{}: {err}", source.display()));
            continue;
        }
        debug!("Archived {} to {}", source.display(), target.display());
        stats.record_archive();

        if let Err(err) = fs::remove_dir_all(&source) {
            error!(
                "Failed to delete the original operation log directory {}: {err}",
                source.display()
            );
            stats.record_error(format!("{}: {err}", source.display()));
        }
    }
}

/// Write the tree under `source` into a gzip-compressed tar at `target`.
///
/// Entry names are relative to `source`. The bundle is assembled at
/// `<target>.tmp` and only renamed to `target` once fully written and synced.
pub fn bundle_dir(source: &Path, target: &Path) -> Result<()> {
    let tmp = tmp_path(target);
    let _ = fs::remove_file(&tmp);

    if let Err(err) = write_bundle(source, &tmp) {
        let _ = fs::remove_file(&tmp);
        return Err(err);
    }
    fs::rename(&tmp, target)?;
    if let Some(parent) = target.parent() {
        fsync_dir(parent)?;
    }
    Ok(())
}

fn write_bundle(source: &Path, dest: &Path) -> Result<()> {
    let output = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(dest)?;

    let encoder = GzEncoder::new(output, Compression::default());
    let mut builder = tar::Builder::new(encoder);
    append_tree(&mut builder, source)?;

    let encoder = builder.into_inner()?;
    let mut output = encoder.finish()?;
    output.flush()?;
    output.sync_all()?;
    Ok(())
}

fn append_tree<W: Write>(builder: &mut tar::Builder<W>, root: &Path) -> Result<()> {
    for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        let name = path
            .strip_prefix(root)
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::Other, err))?;
        if entry.file_type().is_dir() {
            builder.append_dir(name, path)?;
        } else {
            builder.append_path_with_name(path, name)?;
        }
    }
    Ok(())
}

fn fsync_dir(path: &Path) -> Result<()> {
    let dir = File::open(path)?;
    dir.sync_all()?;
    Ok(())
}
