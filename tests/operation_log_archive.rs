use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use logkeeper::archive::archive_dated_dirs;
use logkeeper::{MaintenanceStats, RetentionPolicy};
use tempfile::tempdir;
use time::macros::datetime;

fn bundle_files(path: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    let mut archive = tar::Archive::new(GzDecoder::new(File::open(path).expect("open bundle")));
    let mut files = BTreeMap::new();
    for entry in archive.entries().expect("entries") {
        let mut entry = entry.expect("entry");
        if entry.header().entry_type().is_dir() {
            continue;
        }
        let name = entry.path().expect("entry path").into_owned();
        let mut buf = Vec::new();
        entry.read_to_end(&mut buf).expect("read entry");
        files.insert(name, buf);
    }
    files
}

#[test]
fn month_old_directory_is_bundled_and_removed() {
    let temp = tempdir().expect("tempdir");
    let op_dir = temp.path().join("operation_log");
    let old = op_dir.join("2025-06-01");
    let recent = op_dir.join("2025-07-15");
    fs::create_dir_all(old.join("b")).expect("mkdir old");
    fs::create_dir_all(&recent).expect("mkdir recent");
    fs::write(old.join("a"), b"first record\n").expect("write a");
    fs::write(old.join("b").join("c"), b"nested record\n").expect("write c");
    fs::write(recent.join("a"), b"recent\n").expect("write recent");

    let policy = RetentionPolicy::with_defaults(datetime!(2025-08-01 09:00 UTC));
    let mut stats = MaintenanceStats::new();
    archive_dated_dirs(&op_dir, policy.archive_before, &mut stats);

    assert_eq!(stats.archived_count, 1);
    assert!(!stats.has_errors());
    assert!(!old.exists());
    let bundle = op_dir.join("2025-06-01.tar.gz");
    assert!(bundle.exists());
    assert!(!op_dir.join("2025-06-01.tar.gz.tmp").exists());

    let files = bundle_files(&bundle);
    assert_eq!(files.len(), 2);
    assert_eq!(files[Path::new("a")], b"first record\n".to_vec());
    assert_eq!(files[Path::new("b/c")], b"nested record\n".to_vec());

    assert!(recent.join("a").exists());
    assert!(!op_dir.join("2025-07-15.tar.gz").exists());
}

#[test]
fn existing_bundle_is_left_alone() {
    let temp = tempdir().expect("tempdir");
    let op_dir = temp.path().join("operation_log");
    let source = op_dir.join("2025-05-02");
    fs::create_dir_all(&source).expect("mkdir");
    fs::write(source.join("a"), b"never bundled").expect("write");
    let bundle = op_dir.join("2025-05-02.tar.gz");
    fs::write(&bundle, b"marker").expect("write marker");

    let mut stats = MaintenanceStats::new();
    archive_dated_dirs(&op_dir, datetime!(2025-07-01 10:00 UTC), &mut stats);

    assert_eq!(stats.archived_count, 0);
    assert!(!stats.has_errors());
    assert_eq!(fs::read(&bundle).expect("read marker"), b"marker");
    assert!(source.join("a").exists());
}

#[test]
fn leftover_tmp_bundle_is_not_a_marker() {
    let temp = tempdir().expect("tempdir");
    let op_dir = temp.path().join("operation_log");
    let source = op_dir.join("2025-04-10");
    fs::create_dir_all(&source).expect("mkdir");
    fs::write(source.join("a"), b"payload").expect("write");
    fs::write(op_dir.join("2025-04-10.tar.gz.tmp"), b"partial").expect("write partial");

    let mut stats = MaintenanceStats::new();
    archive_dated_dirs(&op_dir, datetime!(2025-07-01 10:00 UTC), &mut stats);

    assert_eq!(stats.archived_count, 1);
    assert!(!source.exists());
    assert!(!op_dir.join("2025-04-10.tar.gz.tmp").exists());
    let files = bundle_files(&op_dir.join("2025-04-10.tar.gz"));
    assert_eq!(files[Path::new("a")], b"payload".to_vec());
}

#[test]
fn cutoff_day_is_archived_by_a_daytime_run() {
    let temp = tempdir().expect("tempdir");
    let op_dir = temp.path().join("operation_log");
    fs::create_dir_all(op_dir.join("2025-07-01")).expect("mkdir");
    fs::write(op_dir.join("2025-07-01").join("a"), b"edge").expect("write");

    let policy = RetentionPolicy::with_defaults(datetime!(2025-08-01 10:00 UTC));
    let mut stats = MaintenanceStats::new();
    archive_dated_dirs(&op_dir, policy.archive_before, &mut stats);

    assert_eq!(stats.archived_count, 1);
    assert!(!op_dir.join("2025-07-01").exists());
    assert!(op_dir.join("2025-07-01.tar.gz").exists());
}

#[cfg(unix)]
#[test]
fn failed_bundle_keeps_source_and_leaves_no_output() {
    let temp = tempdir().expect("tempdir");
    let op_dir = temp.path().join("operation_log");
    let source = op_dir.join("2025-03-03");
    fs::create_dir_all(&source).expect("mkdir");
    fs::write(source.join("a"), b"kept").expect("write");
    std::os::unix::fs::symlink(temp.path().join("missing"), source.join("z-link"))
        .expect("symlink");

    let mut stats = MaintenanceStats::new();
    archive_dated_dirs(&op_dir, datetime!(2025-07-01 10:00 UTC), &mut stats);

    assert_eq!(stats.archived_count, 0);
    assert_eq!(stats.error_count, 1);
    assert!(source.join("a").exists());
    assert!(!op_dir.join("2025-03-03.tar.gz").exists());
    assert!(!op_dir.join("2025-03-03.tar.gz.tmp").exists());

    fs::remove_file(source.join("z-link")).expect("remove link");
    let mut stats = MaintenanceStats::new();
    archive_dated_dirs(&op_dir, datetime!(2025-07-01 10:00 UTC), &mut stats);

    assert_eq!(stats.archived_count, 1);
    assert!(!source.exists());
    let files = bundle_files(&op_dir.join("2025-03-03.tar.gz"));
    assert_eq!(files[Path::new("a")], b"kept".to_vec());
}
