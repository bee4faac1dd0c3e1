//! Statistics for a maintenance run.

use std::time::Duration;

/// Outcome of one maintenance run.
///
/// Failures are recorded here and logged; they are never returned as errors.
#[derive(Debug, Clone, Default)]
pub struct MaintenanceStats {
    /// Log files matched into a bucket.
    pub scanned_count: usize,

    /// Files deleted because their bucket exceeded the retention window.
    pub deleted_count: usize,

    /// Files replaced by a `.gz` sibling.
    pub compressed_count: usize,

    /// Dated directories replaced by a `.tar.gz` bundle.
    pub archived_count: usize,

    /// Bytes saved by compression.
    pub bytes_saved: u64,

    /// Number of per-item failures.
    pub error_count: usize,

    /// Per-item failure messages.
    pub errors: Vec<String>,

    /// Another run held the maintenance lock; nothing was touched.
    pub skipped_locked: bool,

    /// Time taken for the run.
    pub duration: Duration,
}

impl MaintenanceStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_deletion(&mut self) {
        self.deleted_count += 1;
    }

    pub fn record_compression(&mut self, original_size: u64, compressed_size: u64) {
        self.compressed_count += 1;
        self.bytes_saved += original_size.saturating_sub(compressed_size);
    }

    pub fn record_archive(&mut self) {
        self.archived_count += 1;
    }

    pub fn record_error(&mut self, error: String) {
        self.error_count += 1;
        self.errors.push(error);
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    pub fn summary(&self) -> String {
        format!(
            "Scanned: {}, Deleted: {}, Compressed: {}, Archived: {}, Saved: {} bytes, Errors: {}, Duration: {:?}",
            self.scanned_count,
            self.deleted_count,
            self.compressed_count,
            self.archived_count,
            self.bytes_saved,
            self.error_count,
            self.duration
        )
    }
}
