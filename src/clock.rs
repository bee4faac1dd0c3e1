use time::OffsetDateTime;

/// A source of wall-clock time for a maintenance run.
///
/// The run samples the clock once and derives every cutoff from that
/// snapshot, so the classifier, retention engine and archiver never read
/// the time themselves.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> OffsetDateTime;
}

/// Local wall clock. Falls back to UTC when the local offset cannot be
/// determined (for example in a multi-threaded process on some platforms).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
    }
}

/// A clock pinned to one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub OffsetDateTime);

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.0
    }
}
