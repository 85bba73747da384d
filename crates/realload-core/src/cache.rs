//! Latest-value load cache shared by the sampler and the scorer.
//!
//! Each node maps to an `AtomicU64` holding the bit pattern of its most
//! recent load. Overwriting a known node only needs a shared lock plus an
//! atomic store, so scoring reads never wait on the sampler rewriting
//! values. Keys are spread over a fixed set of shards; the exclusive lock
//! of a shard is taken only the first time one of its nodes is seen.

use std::collections::HashMap;
use std::hash::{BuildHasher, RandomState};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

const SHARDS: usize = 16;

type Shard = RwLock<HashMap<String, AtomicU64>>;

/// Concurrent node → latest load map.
///
/// There is no eviction: a node that leaves the cluster keeps its last
/// value until the process exits.
#[derive(Debug)]
pub struct LoadCache {
    shards: Box<[Shard]>,
    hasher: RandomState,
}

impl Default for LoadCache {
    fn default() -> Self {
        Self {
            shards: (0..SHARDS).map(|_| Shard::default()).collect(),
            hasher: RandomState::new(),
        }
    }
}

impl LoadCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn shard(&self, node: &str) -> &Shard {
        let idx = self.hasher.hash_one(node) as usize % self.shards.len();
        &self.shards[idx]
    }

    /// Store `value` as the latest load for `node`, overwriting any
    /// previous value.
    pub fn store(&self, node: &str, value: f64) {
        let bits = value.to_bits();
        let shard = self.shard(node);
        {
            let slots = shard.read();
            if let Some(slot) = slots.get(node) {
                slot.store(bits, Ordering::Release);
                return;
            }
        }

        // First observation. Another writer may have inserted the key
        // between dropping the read guard and taking the write guard.
        let mut slots = shard.write();
        match slots.get(node) {
            Some(slot) => slot.store(bits, Ordering::Release),
            None => {
                slots.insert(node.to_string(), AtomicU64::new(bits));
            }
        }
    }

    /// Latest load for `node`, or `None` if it was never stored.
    pub fn load(&self, node: &str) -> Option<f64> {
        let slots = self.shard(node).read();
        slots
            .get(node)
            .map(|slot| f64::from_bits(slot.load(Ordering::Acquire)))
    }

    pub fn contains(&self, node: &str) -> bool {
        self.shard(node).read().contains_key(node)
    }

    /// Number of nodes ever observed.
    pub fn len(&self) -> usize {
        self.shards.iter().map(|shard| shard.read().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(|shard| shard.read().is_empty())
    }

    /// Copy of every entry, sorted by node name.
    pub fn snapshot(&self) -> Vec<(String, f64)> {
        let mut entries: Vec<(String, f64)> = Vec::new();
        for shard in self.shards.iter() {
            let slots = shard.read();
            entries.extend(
                slots
                    .iter()
                    .map(|(node, slot)| (node.clone(), f64::from_bits(slot.load(Ordering::Acquire)))),
            );
        }

        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}
