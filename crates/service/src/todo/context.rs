use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Time source for `created_at` / `updated_at`.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Source of fresh record ids.
pub trait IdGenerator: Send + Sync {
    fn new_id(&self) -> String;
}

/// Wall clock that never hands out a timestamp earlier than one it already returned.
#[derive(Debug, Default)]
pub struct SystemClock {
    last_nanos: AtomicI64,
}

impl SystemClock {
    pub fn new() -> Self { Self::default() }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        let wall = Utc::now();
        let Some(nanos) = wall.timestamp_nanos_opt() else {
            return wall;
        };
        let prev = self.last_nanos.fetch_max(nanos, Ordering::SeqCst);
        if prev > nanos {
            DateTime::from_timestamp_nanos(prev)
        } else {
            wall
        }
    }
}

/// Random v4 UUIDs, 36 bytes each.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn new_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_never_goes_backwards() {
        let clock = SystemClock::new();
        let mut last = clock.now();
        for _ in 0..1000 {
            let now = clock.now();
            assert!(now >= last);
            last = now;
        }
    }

    #[test]
    fn system_clock_clamps_to_highest_seen() {
        let clock = SystemClock::new();
        let future = Utc::now() + chrono::Duration::hours(1);
        clock.last_nanos.store(future.timestamp_nanos_opt().unwrap(), Ordering::SeqCst);
        assert_eq!(clock.now(), future);
    }

    #[test]
    fn uuid_ids_are_distinct() {
        let ids = UuidGenerator;
        let a = ids.new_id();
        let b = ids.new_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 36);
    }
}
