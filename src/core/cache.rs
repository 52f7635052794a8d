//! Single-value TTL cache with an injected clock
//!
//! Holds one computed value per platform instance (the wallet stats) and
//! recomputes it once the TTL has elapsed. The clock is a trait object so
//! expiry can be tested without sleeping.

use crate::core::traits::Clock;
use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, Mutex, MutexGuard};

/// Wall-clock time
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        ManualClock {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[derive(Debug)]
struct Slot<V> {
    value: V,
    expires_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct TtlCache<V> {
    clock: Arc<dyn Clock>,
    ttl: Duration,
    slot: Mutex<Option<Slot<V>>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        TtlCache {
            clock,
            ttl,
            slot: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Slot<V>>> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Cached value if still fresh, otherwise recompute and store
    ///
    /// `compute` runs with the cache lock held, so concurrent callers wait
    /// for one computation instead of racing.
    pub fn get_or_compute<F>(&self, compute: F) -> V
    where
        F: FnOnce() -> V,
    {
        let now = self.clock.now();
        let mut slot = self.lock();

        if let Some(cached) = slot.as_ref() {
            if now < cached.expires_at {
                return cached.value.clone();
            }
        }

        let value = compute();
        *slot = Some(Slot {
            value: value.clone(),
            expires_at: now + self.ttl,
        });
        value
    }

    pub fn invalidate(&self) {
        *self.lock() = None;
    }
}
