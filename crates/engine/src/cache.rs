//! Time-boxed memo of per-sheet reads.
//!
//! The whole cache shares one reset instant: once `interval` has elapsed
//! every entry is dropped together, so a listing is never assembled from
//! sheets of different ages by more than one interval. Entries beyond
//! `capacity` are evicted least-recently-used.

use crate::clock::Clock;
use casedesk_gateway::{GatewayError, SheetGateway, SheetSnapshot};
use casedesk_protocol::CacheStats;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

struct CacheState {
    entries: LruCache<String, Arc<SheetSnapshot>>,
    last_reset: Instant,
    hits: u64,
    misses: u64,
    resets: u64,
}

pub struct RecordCache {
    gateway: Arc<dyn SheetGateway>,
    clock: Arc<dyn Clock>,
    interval: Duration,
    state: Mutex<CacheState>,
}

impl RecordCache {
    pub fn new(
        gateway: Arc<dyn SheetGateway>,
        clock: Arc<dyn Clock>,
        interval: Duration,
        capacity: usize,
    ) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        let now = clock.now();
        Self {
            gateway,
            clock,
            interval,
            state: Mutex::new(CacheState {
                entries: LruCache::new(capacity),
                last_reset: now,
                hits: 0,
                misses: 0,
                resets: 0,
            }),
        }
    }

    /// Drop every entry if the interval has elapsed since the last reset.
    /// Returns whether a reset happened.
    pub fn expire_if_due(&self) -> bool {
        let now = self.clock.now();
        let mut state = self.lock();
        if now.saturating_duration_since(state.last_reset) <= self.interval {
            return false;
        }
        let dropped = state.entries.len();
        state.entries.clear();
        state.last_reset = now;
        state.resets += 1;
        log::debug!("Record cache reset, dropped {dropped} sheet(s)");
        true
    }

    /// Header row and records of `title`, read through the cache.
    ///
    /// Misses go to the gateway without holding the lock; failures are
    /// returned as-is and leave nothing behind.
    pub async fn get_records(&self, title: &str) -> Result<Arc<SheetSnapshot>, GatewayError> {
        self.expire_if_due();

        let generation = {
            let mut state = self.lock();
            if let Some(hit) = state.entries.get(title).cloned() {
                state.hits += 1;
                return Ok(hit);
            }
            state.misses += 1;
            state.resets
        };

        let snapshot = Arc::new(self.gateway.read_sheet(title).await?);

        let mut state = self.lock();
        // A reset while we were fetching means this read may predate it.
        if state.resets == generation {
            state.entries.put(title.to_string(), Arc::clone(&snapshot));
        }
        Ok(snapshot)
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.lock();
        CacheStats {
            entries: state.entries.len(),
            capacity: state.entries.cap().get(),
            hits: state.hits,
            misses: state.misses,
            resets: state.resets,
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
