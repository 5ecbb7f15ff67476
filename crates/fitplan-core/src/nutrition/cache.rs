use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::Serialize;

use super::FoodDetail;

pub const DEFAULT_CAPACITY: usize = 100;
pub const DEFAULT_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

struct CacheEntry {
    food: FoodDetail,
    inserted_at: Instant,
    last_used: Instant,
}

#[derive(Default)]
struct CacheInner {
    entries: HashMap<i64, CacheEntry>,
    hits: u64,
    misses: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
}

/// Bounded food-detail cache keyed by FDC id.
///
/// Entries expire `ttl` after insertion; a hit does not extend the
/// lifetime but does make the entry the most recently used. When full,
/// the least recently used entry is evicted.
pub struct FoodCache {
    capacity: usize,
    ttl: Duration,
    inner: Mutex<CacheInner>,
}

impl FoodCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            capacity: capacity.max(1),
            ttl,
            inner: Mutex::new(CacheInner::default()),
        }
    }

    pub fn get(&self, fdc_id: i64) -> Option<FoodDetail> {
        self.get_at(fdc_id, Instant::now())
    }

    pub fn insert(&self, food: FoodDetail) {
        self.insert_at(food, Instant::now());
    }

    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.hits = 0;
        inner.misses = 0;
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        CacheStats {
            size: inner.entries.len(),
            capacity: self.capacity,
            hits: inner.hits,
            misses: inner.misses,
        }
    }

    fn get_at(&self, fdc_id: i64, now: Instant) -> Option<FoodDetail> {
        let mut inner = self.lock();
        let expired = match inner.entries.get_mut(&fdc_id) {
            Some(entry) if now.duration_since(entry.inserted_at) <= self.ttl => {
                entry.last_used = now;
                let food = entry.food.clone();
                inner.hits += 1;
                return Some(food);
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            inner.entries.remove(&fdc_id);
        }
        inner.misses += 1;
        None
    }

    fn insert_at(&self, food: FoodDetail, now: Instant) {
        let ttl = self.ttl;
        let mut inner = self.lock();
        inner
            .entries
            .retain(|_, e| now.duration_since(e.inserted_at) <= ttl);

        if !inner.entries.contains_key(&food.fdc_id) && inner.entries.len() >= self.capacity {
            if let Some(victim) = inner
                .entries
                .iter()
                .min_by_key(|(_, e)| e.last_used)
                .map(|(id, _)| *id)
            {
                inner.entries.remove(&victim);
            }
        }
        inner.entries.insert(
            food.fdc_id,
            CacheEntry {
                food,
                inserted_at: now,
                last_used: now,
            },
        );
    }

    // A poisoned lock only means another thread panicked mid-update; the
    // map is still structurally valid.
    fn lock(&self) -> std::sync::MutexGuard<'_, CacheInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for FoodCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_TTL)
    }
}
