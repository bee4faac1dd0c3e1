//! Retention thresholds derived from a single clock snapshot.

use std::time::SystemTime;

use time::{Date, Month, OffsetDateTime, Time};

pub const DEFAULT_RETAIN_COUNT: usize = 30;
pub const DEFAULT_ARCHIVE_AFTER_MONTHS: u32 = 1;

/// Thresholds for one maintenance run. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Files kept per bucket; older ones are deleted.
    pub retain_count: usize,
    /// Retained files modified strictly before this are compressed.
    pub compact_before: SystemTime,
    /// Dated directories whose midnight falls strictly before this instant
    /// are archived.
    pub archive_before: OffsetDateTime,
}

impl RetentionPolicy {
    /// Build the policy for a run observed at `now`.
    ///
    /// `compact_before` is midnight of `now`'s calendar day in `now`'s offset;
    /// `archive_before` is `now` moved back `archive_after_months`, keeping
    /// the time of day, so a directory dated on the shifted day is archived
    /// by any run after midnight.
    pub fn at(now: OffsetDateTime, retain_count: usize, archive_after_months: u32) -> Self {
        let midnight = now.replace_time(Time::MIDNIGHT);
        Self {
            retain_count,
            compact_before: SystemTime::from(midnight),
            archive_before: now.replace_date(months_before(now.date(), archive_after_months)),
        }
    }

    pub fn with_defaults(now: OffsetDateTime) -> Self {
        Self::at(now, DEFAULT_RETAIN_COUNT, DEFAULT_ARCHIVE_AFTER_MONTHS)
    }
}

/// Shift `date` back by whole calendar months, clamping the day to the
/// length of the target month (2025-03-31 minus one month is 2025-02-28).
pub fn months_before(date: Date, months: u32) -> Date {
    let total = date.year() as i64 * 12 + (date.month() as u8 as i64 - 1) - months as i64;
    let year = total.div_euclid(12) as i32;
    let month = Month::try_from((total.rem_euclid(12) + 1) as u8).unwrap_or(Month::January);
    let day = date.day().min(time::util::days_in_year_month(year, month));
    Date::from_calendar_date(year, month, day).unwrap_or(date)
}
