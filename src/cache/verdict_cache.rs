use crate::types::AggregateVerdict;
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Clone)]
struct CacheEntry {
    verdict: AggregateVerdict,
    cached_at_ms: u64,
    ttl_ms: u64,
    /// Monotonic recency counter, bumped on every hit.
    last_used: u64,
}

impl CacheEntry {
    fn is_expired(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.cached_at_ms) >= self.ttl_ms
    }
}

/// Bounded in-memory verdict cache: entries expire after their TTL, and when
/// the capacity bound is reached the least-recently-used entry is evicted.
/// Nothing survives a process restart.
pub struct VerdictCache {
    entries: HashMap<String, CacheEntry>,
    capacity: usize,
    tick: u64,
}

impl VerdictCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            capacity: capacity.max(1),
            tick: 0,
        }
    }

    /// Expired entries behave as a miss and are evicted on the spot.
    pub fn get(&mut self, key: &str) -> Option<AggregateVerdict> {
        let now = current_millis();

        let expired = self.entries.get(key)?.is_expired(now);
        if expired {
            self.entries.remove(key);
            return None;
        }

        self.tick += 1;
        let entry = self.entries.get_mut(key)?;
        entry.last_used = self.tick;
        Some(entry.verdict.clone())
    }

    pub fn put(&mut self, key: String, verdict: AggregateVerdict, ttl_ms: u64) {
        if self.entries.len() >= self.capacity && !self.entries.contains_key(&key) {
            self.evict_lru();
        }

        self.tick += 1;
        self.entries.insert(
            key,
            CacheEntry {
                verdict,
                cached_at_ms: current_millis(),
                ttl_ms,
                last_used: self.tick,
            },
        );
    }

    fn evict_lru(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_used)
            .map(|(key, _)| key.clone());

        if let Some(key) = oldest {
            self.entries.remove(&key);
        }
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every expired entry.
    pub fn cleanup(&mut self) {
        let now = current_millis();
        self.entries.retain(|_, entry| !entry.is_expired(now));
    }
}

pub fn current_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
