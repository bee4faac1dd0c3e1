use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Exclusive advisory lock held for the duration of a maintenance run.
///
/// Released when dropped (the `flock` goes away with the descriptor).
#[derive(Debug)]
pub struct MaintenanceLock {
    _file: File,
    path: PathBuf,
}

impl MaintenanceLock {
    /// Take the lock at `path` without blocking. Fails with
    /// [`Error::Locked`] if another process holds it.
    pub fn acquire(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)?;
        if !try_lock(&file)? {
            return Err(Error::Locked(path.display().to_string()));
        }
        write_lock_record(&file)?;
        Ok(Self {
            _file: file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn try_lock(file: &File) -> Result<bool> {
    let res = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
    if res == 0 {
        return Ok(true);
    }
    let err = std::io::Error::last_os_error();
    if err.kind() == std::io::ErrorKind::WouldBlock {
        return Ok(false);
    }
    Err(Error::Io(err))
}

fn write_lock_record(file: &File) -> Result<()> {
    let record = format!("{}\n", std::process::id());
    let mut handle = file.try_clone()?;
    handle.set_len(0)?;
    handle.seek(SeekFrom::Start(0))?;
    handle.write_all(record.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn second_acquire_is_rejected_until_release() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join(".logkeeper.lock");

        let held = MaintenanceLock::acquire(&path).expect("first lock");
        assert_eq!(held.path(), path.as_path());
        let err = MaintenanceLock::acquire(&path).unwrap_err();
        assert!(matches!(err, Error::Locked(_)));

        drop(held);
        MaintenanceLock::acquire(&path).expect("lock after release");
    }

    #[test]
    fn lock_file_records_pid() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join(".logkeeper.lock");
        let _held = MaintenanceLock::acquire(&path).expect("lock");
        let contents = std::fs::read_to_string(&path).expect("read");
        assert_eq!(contents.trim(), std::process::id().to_string());
    }
}
