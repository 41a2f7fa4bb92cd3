//! Single-slot TTL cache for fetched worksheets.
//!
//! Remote tables change rarely and queries arrive in bursts, so one cached
//! snapshot with a freshness window covers the access pattern. The slot
//! holds an `Arc` so readers share the snapshot without cloning it.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

struct Slot<T> {
    value: Arc<T>,
    filled_at: Instant,
}

/// A one-value cache with a time-to-live.
///
/// `get` returns the cached value only while it is fresh; `store` replaces
/// the slot and restarts the clock; `invalidate` empties it (used for the
/// `refresh=1` agent context flag). A zero TTL makes every `get` miss.
pub struct TtlCache<T> {
    ttl: Duration,
    slot: Mutex<Option<Slot<T>>>,
}

impl<T> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: Mutex::new(None),
        }
    }

    /// The cached value, if present and still fresh.
    pub fn get(&self) -> Option<Arc<T>> {
        let guard = self.slot.lock().ok()?;
        let slot = guard.as_ref()?;
        if slot.filled_at.elapsed() < self.ttl {
            Some(Arc::clone(&slot.value))
        } else {
            None
        }
    }

    /// Fill the slot and return a shared handle to the stored value.
    pub fn store(&self, value: T) -> Arc<T> {
        let value = Arc::new(value);
        if let Ok(mut guard) = self.slot.lock() {
            *guard = Some(Slot {
                value: Arc::clone(&value),
                filled_at: Instant::now(),
            });
        }
        value
    }

    /// Drop the cached value so the next `get` misses.
    pub fn invalidate(&self) {
        if let Ok(mut guard) = self.slot.lock() {
            *guard = None;
        }
    }
}
