//! Periodic maintenance of a service's log tree.

use std::time::{Duration, Instant};

use log::{debug, error, info, warn};
use time::OffsetDateTime;

use crate::archive::archive_dated_dirs;
use crate::classify::classify;
use crate::clock::Clock;
use crate::config::MaintenanceConfig;
use crate::layout::LogLayout;
use crate::lock::MaintenanceLock;
use crate::policy::RetentionPolicy;
use crate::retention::reconcile;
use crate::stats::MaintenanceStats;
use crate::Error;

/// Runs the retention pipeline over `core` and `core/out`, and the
/// archival pipeline over `core/operation_log`.
pub struct LogMaintenance<C: Clock> {
    config: MaintenanceConfig,
    layout: LogLayout,
    clock: C,
}

impl<C: Clock> LogMaintenance<C> {
    pub fn new(config: MaintenanceConfig, clock: C) -> Self {
        let layout = LogLayout::new(&config.base_dir);
        Self {
            config,
            layout,
            clock,
        }
    }

    /// One full pass. Never fails: per-item problems are logged and counted.
    pub fn run_once(&self) -> MaintenanceStats {
        let start = Instant::now();
        let mut stats = MaintenanceStats::new();

        let _lock = if self.config.lock && self.layout.core_dir().is_dir() {
            match MaintenanceLock::acquire(&self.layout.lock_path()) {
                Ok(lock) => Some(lock),
                Err(Error::Locked(path)) => {
                    warn!("Maintenance lock {path} is held by another run; skipped.");
                    stats.skipped_locked = true;
                    stats.duration = start.elapsed();
                    return stats;
                }
                Err(err) => {
                    error!("Failed to take maintenance lock: {err}");
                    stats.record_error(format!("{}: {err}", self.layout.lock_path().display()));
                    None
                }
            }
        } else {
            None
        };

        self.run_at(self.clock.now(), &mut stats);

        stats.duration = start.elapsed();
        info!("Log maintenance finished. {}", stats.summary());
        stats
    }

    /// Run [`run_once`](Self::run_once) every `interval`, forever.
    pub fn run_loop(&self, interval: Duration) -> ! {
        loop {
            self.run_once();
            std::thread::sleep(interval);
        }
    }

    fn run_at(&self, now: OffsetDateTime, stats: &mut MaintenanceStats) {
        let policy = RetentionPolicy::at(
            now,
            self.config.retain_count,
            self.config.archive_after_months,
        );

        for dir in self.layout.standard_dirs() {
            if !dir.exists() {
                debug!("Regular log directory '{}' does not exist; skipped.", dir.display());
                continue;
            }
            for (bucket, files) in classify(&dir, &self.config.log_pattern, stats) {
                stats.scanned_count += files.len();
                reconcile(
                    bucket,
                    files,
                    policy.retain_count,
                    policy.compact_before,
                    stats,
                );
            }
        }

        let operation_log_dir = self.layout.operation_log_dir();
        if !operation_log_dir.exists() {
            debug!(
                "Operation log directory '{}' does not exist. Skipping.",
                operation_log_dir.display()
            );
        } else {
            archive_dated_dirs(&operation_log_dir, policy.archive_before, stats);
        }
    }
}
