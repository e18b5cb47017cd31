use std::sync::Arc;

use xxhash_rust::xxh3::Xxh3;

use super::{EdgeBackend, EdgeData, compute_edge_data};
use crate::grid::Field2;

const XXH3_SEED: u64 = 0x6c1f_0e9a_52d3_b477;

/// Entries kept before the least recently used one is evicted.
pub const DEFAULT_EDGE_CACHE_CAPACITY: usize = 16;

/// Identity of a gray image: shape plus a 128-bit content digest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EdgeKey {
    pub rows: usize,
    pub cols: usize,
    pub digest: u128,
    pub backend: EdgeBackend,
}

impl EdgeKey {
    pub fn of(gray: &Field2, backend: EdgeBackend) -> Self {
        let mut h = Xxh3::with_seed(XXH3_SEED);
        for v in gray.as_slice() {
            h.update(&v.to_bits().to_le_bytes());
        }
        Self {
            rows: gray.rows(),
            cols: gray.cols(),
            digest: h.digest128(),
            backend,
        }
    }
}

/// Bounded LRU memo of [`EdgeData`] keyed by image identity.
///
/// Results are shared as `Arc`s; a hit returns the very same allocation as the first call.
#[derive(Debug)]
pub struct EdgeFieldCache {
    backend: EdgeBackend,
    capacity: usize,
    /// Most recently used last.
    entries: Vec<(EdgeKey, Arc<EdgeData>)>,
    hits: u64,
    misses: u64,
}

impl Default for EdgeFieldCache {
    fn default() -> Self {
        Self::new(EdgeBackend::default(), DEFAULT_EDGE_CACHE_CAPACITY)
    }
}

impl EdgeFieldCache {
    pub fn new(backend: EdgeBackend, capacity: usize) -> Self {
        Self {
            backend,
            capacity: capacity.max(1),
            entries: Vec::new(),
            hits: 0,
            misses: 0,
        }
    }

    pub fn backend(&self) -> EdgeBackend {
        self.backend
    }

    /// Switch strategy. Cached results of the other backend stay keyed apart.
    pub fn set_backend(&mut self, backend: EdgeBackend) {
        self.backend = backend;
    }

    /// Edge mask and distance field of `gray`, computed at most once per distinct image.
    pub fn get_edge_data(&mut self, gray: &Field2) -> Arc<EdgeData> {
        let key = EdgeKey::of(gray, self.backend);
        if let Some(pos) = self.entries.iter().position(|(k, _)| *k == key) {
            self.hits += 1;
            let entry = self.entries.remove(pos);
            let data = Arc::clone(&entry.1);
            self.entries.push(entry);
            return data;
        }

        self.misses += 1;
        tracing::debug!(
            rows = key.rows,
            cols = key.cols,
            backend = self.backend.name(),
            "computing edge data"
        );
        let data = Arc::new(compute_edge_data(gray, self.backend));
        if self.entries.len() >= self.capacity {
            self.entries.remove(0);
        }
        self.entries.push((key, Arc::clone(&data)));
        data
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop every entry (counters are kept).
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/edges/cache.rs"]
mod tests;
