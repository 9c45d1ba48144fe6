//! Sliding-window rate limiting.
//!
//! Callers depend on the [`RateLimitStore`] trait. The in-memory log below is
//! process-local and only correct for a single instance; a multi-instance
//! deployment needs a shared-store implementation of the same trait.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// One hour, the window used by every portal quota.
pub const HOURLY: Duration = Duration::from_secs(3600);

#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Records a hit for `key` and reports whether it fits in `limit` hits per
    /// `window`. Rejected hits are not recorded.
    async fn allow(&self, key: &str, window: Duration, limit: u32) -> bool;
}

/// Per-key timestamp log kept in process memory.
#[derive(Clone)]
pub struct InMemoryRateLimiter {
    inner: Arc<Mutex<HashMap<String, VecDeque<Instant>>>>,
    max_keys: usize,
}

impl InMemoryRateLimiter {
    pub fn new(max_keys: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            max_keys,
        }
    }

    fn allow_at(&self, key: &str, window: Duration, limit: u32, now: Instant) -> bool {
        if limit == 0 {
            return false;
        }

        let mut inner = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let queue = inner.entry(key.to_string()).or_default();
        prune_queue(queue, now, window);
        if queue.len() >= limit as usize {
            return false;
        }
        queue.push_back(now);

        if inner.len() > self.max_keys {
            inner.retain(|_, events| {
                prune_queue(events, now, window);
                !events.is_empty()
            });
        }

        true
    }
}

impl Default for InMemoryRateLimiter {
    fn default() -> Self {
        Self::new(100_000)
    }
}

#[async_trait]
impl RateLimitStore for InMemoryRateLimiter {
    async fn allow(&self, key: &str, window: Duration, limit: u32) -> bool {
        self.allow_at(key, window, limit, Instant::now())
    }
}

fn prune_queue(queue: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(front) = queue.front() {
        if now.duration_since(*front) >= window {
            queue.pop_front();
        } else {
            break;
        }
    }
}
