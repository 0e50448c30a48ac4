//! Value-keyed caches for junction trees and propagated potentials.
//!
//! Keys are content hashes, never object identity: two structurally equal
//! networks share entries, and an edited network gets a new signature.
//! Each cache computes a missing entry while holding its lock, so a key is
//! computed at most once even under concurrent callers. When both locks are
//! needed the potential cache is always taken first.

use jt_common::Result;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

use super::engine::RawInference;
use crate::structure::JunctionTree;

/// Structure signature plus the sorted forced-clique node ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StructureKey {
    pub network: String,
    pub forced: Vec<String>,
}

impl StructureKey {
    pub fn new(network: &str, forced: &[String]) -> Self {
        let mut forced = forced.to_vec();
        forced.sort();
        forced.dedup();
        Self {
            network: network.to_string(),
            forced,
        }
    }
}

/// Network signature plus the evidence content hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PotentialKey {
    pub network: String,
    pub evidence: String,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Counters {
    fn hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    fn miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    fn read(&self) -> (u64, u64) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }
}

/// Junction trees by structure key.
#[derive(Debug, Default)]
pub struct StructureCache {
    entries: Mutex<HashMap<StructureKey, Arc<JunctionTree>>>,
    counters: Counters,
}

impl StructureCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached tree for `key`, building it on a miss. `force` rebuilds and
    /// replaces any cached entry.
    pub fn get_or_build(
        &self,
        key: StructureKey,
        force: bool,
        build: impl FnOnce() -> Result<JunctionTree>,
    ) -> Result<Arc<JunctionTree>> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if !force {
            if let Some(tree) = entries.get(&key) {
                self.counters.hit();
                debug!(forced = ?key.forced, "structure cache hit");
                return Ok(Arc::clone(tree));
            }
        }
        self.counters.miss();
        debug!(forced = ?key.forced, force, "structure cache miss");
        let tree = Arc::new(build()?);
        entries.insert(key, Arc::clone(&tree));
        Ok(tree)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    pub fn counts(&self) -> (u64, u64) {
        self.counters.read()
    }
}

#[derive(Debug, Default)]
struct Fifo {
    map: HashMap<PotentialKey, Arc<RawInference>>,
    order: VecDeque<PotentialKey>,
}

/// Propagated potentials by potential key, evicting the oldest entry once
/// `capacity` is reached. A capacity of 0 disables caching.
#[derive(Debug)]
pub struct PotentialCache {
    capacity: usize,
    entries: Mutex<Fifo>,
    counters: Counters,
}

impl PotentialCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Mutex::new(Fifo::default()),
            counters: Counters::default(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn get_or_compute(
        &self,
        key: PotentialKey,
        compute: impl FnOnce() -> Result<RawInference>,
    ) -> Result<Arc<RawInference>> {
        if self.capacity == 0 {
            self.counters.miss();
            return compute().map(Arc::new);
        }

        let mut fifo = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(raw) = fifo.map.get(&key) {
            self.counters.hit();
            debug!("potential cache hit");
            return Ok(Arc::clone(raw));
        }
        self.counters.miss();
        debug!("potential cache miss");
        let raw = Arc::new(compute()?);
        while fifo.map.len() >= self.capacity {
            match fifo.order.pop_front() {
                Some(oldest) => {
                    fifo.map.remove(&oldest);
                }
                None => break,
            }
        }
        fifo.order.push_back(key.clone());
        fifo.map.insert(key, Arc::clone(&raw));
        Ok(raw)
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .map
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut fifo = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        fifo.map.clear();
        fifo.order.clear();
    }

    pub fn counts(&self) -> (u64, u64) {
        self.counters.read()
    }
}

/// Hit and miss counters of both caches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub structure_hits: u64,
    pub structure_misses: u64,
    pub structure_entries: usize,
    pub potential_hits: u64,
    pub potential_misses: u64,
    pub potential_entries: usize,
}
