//! Injected source of timestamps and identifiers.
//!
//! Document ids, node ids and name suffixes all come from a
//! [`UniquenessSource`], so production code gets fresh values while tests
//! can pin them.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Clock plus id generator.
pub trait UniquenessSource: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn next_id(&self) -> Uuid;
}

/// Wall clock and random v4 UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemSource;

impl UniquenessSource for SystemSource {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn next_id(&self) -> Uuid {
        Uuid::new_v4()
    }
}

/// A frozen clock and a counter.  Every call to `next_id` yields the next
/// integer as a UUID, starting from 1.
#[derive(Debug)]
pub struct FixedSource {
    instant: DateTime<Utc>,
    counter: AtomicU64,
}

impl FixedSource {
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self {
            instant,
            counter: AtomicU64::new(0),
        }
    }
}

impl UniquenessSource for FixedSource {
    fn now(&self) -> DateTime<Utc> {
        self.instant
    }

    fn next_id(&self) -> Uuid {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        Uuid::from_u128(u128::from(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_source_counts() {
        let source = FixedSource::new(DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(source.next_id(), Uuid::from_u128(1));
        assert_eq!(source.next_id(), Uuid::from_u128(2));
        assert_eq!(source.now(), DateTime::<Utc>::UNIX_EPOCH);
    }

    #[test]
    fn system_source_is_fresh() {
        let source = SystemSource;
        assert_ne!(source.next_id(), source.next_id());
    }
}
