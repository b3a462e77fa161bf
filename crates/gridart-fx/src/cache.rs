#![forbid(unsafe_code)]

//! Memoization of input-invariant work.
//!
//! # Keys
//!
//! A key must capture every input the cached value depends on and nothing
//! that changes per frame. For formula invariants that is exactly
//! [`CacheKey::for_formula`]: the resolution, the formula name and the bit
//! pattern of every static parameter. Pointer, angle and noise never appear in
//! a key. Changing any parameter changes the key, and the stale entry is simply
//! never requested again.
//!
//! # Concurrency
//!
//! Values are published as `Arc<V>` under an `RwLock`. Computation runs
//! outside the lock; if two callers race on the same key the first value
//! published wins and both callers receive it.

use crate::formulas::GridFormula;
use gridart_core::Resolution;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Invariant inputs of a formula's precomputed basis.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub resolution: Resolution,
    pub formula: &'static str,
    /// `f64::to_bits` of each static parameter, in declaration order.
    pub params: Vec<u64>,
}

impl CacheKey {
    pub fn for_formula(resolution: Resolution, formula: &dyn GridFormula) -> Self {
        Self {
            resolution,
            formula: formula.name(),
            params: formula.params().iter().map(|(_, v)| v.to_bits()).collect(),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.formula, self.resolution)?;
        for bits in &self.params {
            write!(f, ":{}", f64::from_bits(*bits))?;
        }
        Ok(())
    }
}

/// Counter snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// Read-mostly map from key to shared value.
pub struct FrameCache<K, V> {
    enabled: bool,
    entries: RwLock<HashMap<K, Arc<V>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<K, V> fmt::Debug for FrameCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.entries.read().map_or(0, |map| map.len());
        f.debug_struct("FrameCache")
            .field("enabled", &self.enabled)
            .field("entries", &entries)
            .field("hits", &self.hits.load(Ordering::Relaxed))
            .field("misses", &self.misses.load(Ordering::Relaxed))
            .finish()
    }
}

impl<K, V> Default for FrameCache<K, V> {
    fn default() -> Self {
        Self::with_enabled(true)
    }
}

impl<K, V> FrameCache<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// A cache that always computes and never stores.
    pub fn disabled() -> Self {
        Self::with_enabled(false)
    }

    pub fn with_enabled(enabled: bool) -> Self {
        Self {
            enabled,
            entries: RwLock::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Drop every entry. Counters are kept.
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }
}

impl<K, V> FrameCache<K, V>
where
    K: Eq + Hash + fmt::Debug,
{
    /// Stored value for `key`, if any. Does not touch the counters.
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Return the value for `key`, running `compute` and storing its result on a miss.
    pub fn get_or_compute<F>(&self, key: K, compute: F) -> Arc<V>
    where
        F: FnOnce() -> V,
    {
        if !self.enabled {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return Arc::new(compute());
        }
        if let Some(hit) = self.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return hit;
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(?key, "frame cache miss");
        let value = Arc::new(compute());

        let mut map = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(map.entry(key).or_insert(value))
    }
}
