//! Identifier generation.
//!
//! Line items are keyed by integers drawn from a monotonically increasing
//! source. The production source is the wall clock (milliseconds since the
//! Unix epoch), bumped so that two ids handed out within the same millisecond
//! still differ.

use chrono::Utc;

use crate::error::{DomainError, DomainResult};

/// Source of fresh, strictly increasing integer identifiers.
pub trait IdGenerator {
    /// Returns an identifier strictly greater than every identifier previously
    /// returned by (or observed by) this generator.
    ///
    /// Fails once the floor has reached `i64::MAX`.
    fn next_id(&mut self) -> DomainResult<i64>;

    /// Raise the floor so that future ids are strictly greater than `id`.
    ///
    /// Used after rehydrating state whose ids were issued by an earlier process.
    fn observe(&mut self, id: i64);
}

impl<G: IdGenerator + ?Sized> IdGenerator for Box<G> {
    fn next_id(&mut self) -> DomainResult<i64> {
        (**self).next_id()
    }

    fn observe(&mut self, id: i64) {
        (**self).observe(id)
    }
}

/// Wall-clock backed generator (milliseconds).
#[derive(Debug, Clone)]
pub struct ClockIdGenerator {
    last: i64,
    clock: fn() -> i64,
}

fn exhausted() -> DomainError {
    DomainError::invariant("identifier space exhausted")
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

impl ClockIdGenerator {
    pub fn new() -> Self {
        Self {
            last: i64::MIN,
            clock: now_millis,
        }
    }

    /// Build a generator over a custom clock (tests freeze or rewind time with this).
    pub fn with_clock(clock: fn() -> i64) -> Self {
        Self {
            last: i64::MIN,
            clock,
        }
    }
}

impl Default for ClockIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for ClockIdGenerator {
    fn next_id(&mut self) -> DomainResult<i64> {
        let now = (self.clock)();
        let next = if now > self.last {
            now
        } else {
            self.last.checked_add(1).ok_or_else(exhausted)?
        };
        self.last = next;
        Ok(next)
    }

    fn observe(&mut self, id: i64) {
        if id > self.last {
            self.last = id;
        }
    }
}

/// Deterministic counter (tests, scripted sessions).
#[derive(Debug, Clone, Default)]
pub struct SequentialIdGenerator {
    last: i64,
}

impl SequentialIdGenerator {
    /// The first id handed out is `start`.
    pub fn starting_at(start: i64) -> Self {
        Self {
            last: start.saturating_sub(1),
        }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&mut self) -> DomainResult<i64> {
        self.last = self.last.checked_add(1).ok_or_else(exhausted)?;
        Ok(self.last)
    }

    fn observe(&mut self, id: i64) {
        if id > self.last {
            self.last = id;
        }
    }
}
