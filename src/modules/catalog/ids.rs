//! Book id allocation.
//!
//! Ids come from the creation time in milliseconds since the Unix epoch. Two
//! books created within the same millisecond (or under a clock that stepped
//! backwards) get `last + 1`, so ids only ever grow.
//!
//! Clock readings are capped at `i64::MAX` milliseconds. That leaves 2^63 ids
//! of headroom for bumping, more than a catalog can ever allocate.

use time::OffsetDateTime;

use super::models::BookId;

const CLOCK_CEILING: u64 = i64::MAX as u64;

/// Source of wall-clock time for id allocation.
pub trait Clock {
    fn now_millis(&self) -> u64;
}

/// The real clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
        u64::try_from(millis).unwrap_or(0)
    }
}

#[derive(Debug, Default)]
pub(crate) struct IdAllocator {
    last: Option<u64>,
}

impl IdAllocator {
    pub(crate) fn next(&mut self, clock: &dyn Clock) -> BookId {
        let now = clock.now_millis().min(CLOCK_CEILING);
        let raw = match self.last {
            Some(last) if now <= last => last + 1,
            _ => now,
        };
        self.last = Some(raw);
        BookId::new(raw)
    }
}
