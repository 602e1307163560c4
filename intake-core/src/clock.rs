//! Timestamps for ledger rows.

use chrono::DateTime;
use chrono::FixedOffset;
use chrono::Offset;
use chrono::SecondsFormat;
use chrono::Utc;

/// Asia/Tokyo, which has no daylight saving.
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = 9 * 60;

/// Source of `created_at` values.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Wall clock rendered in one fixed offset for the whole process.
#[derive(Debug, Clone)]
pub struct OffsetClock {
    offset: FixedOffset,
}

impl OffsetClock {
    /// `None` when the offset is outside ±24h.
    pub fn from_minutes(minutes: i32) -> Option<Self> {
        minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .map(|offset| Self { offset })
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }
}

impl Default for OffsetClock {
    fn default() -> Self {
        let offset = FixedOffset::east_opt(DEFAULT_UTC_OFFSET_MINUTES * 60)
            .unwrap_or_else(|| Utc.fix());
        Self { offset }
    }
}

impl Clock for OffsetClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }
}

/// ISO-8601 with offset and whole seconds, e.g. `2026-10-18T09:30:00+09:00`.
pub fn format_timestamp(at: &DateTime<FixedOffset>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, false)
}
