//! Retention, compaction and archival of rotated service logs.
//!
//! A maintenance run sorts the rotated logs of `<base>/core` and
//! `<base>/core/out` into buckets by filename, deletes the oldest files of
//! each bucket beyond the retention window and gzips retained files from
//! before today. Dated directories under `<base>/core/operation_log` older
//! than the archive cutoff are bundled into `.tar.gz` files.

pub mod archive;
pub mod classify;
pub mod clock;
pub mod config;
pub mod error;
pub mod layout;
pub mod lock;
pub mod maintenance;
pub mod policy;
pub mod retention;
pub mod stats;

pub use classify::{classify, Bucket, LogFile};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::MaintenanceConfig;
pub use error::{Error, Result};
pub use maintenance::LogMaintenance;
pub use policy::RetentionPolicy;
pub use stats::MaintenanceStats;
