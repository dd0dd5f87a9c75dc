use lith_primitives::H256;
use schnellru::{ByLength, LruMap};

/// Bounded recency cache of node hashes known to already exist in storage.
///
/// Saves a store lookup for hashes that were recently written or probed.
/// Purely an optimization: a miss falls through to the store's own
/// key-existence check.
pub(crate) struct AlreadySavedCache {
    map: LruMap<H256, (), ByLength>,
}

impl AlreadySavedCache {
    /// Creates a cache remembering up to `capacity` hashes.
    pub(crate) fn new(capacity: u32) -> Self {
        Self { map: LruMap::new(ByLength::new(capacity)) }
    }

    /// Returns whether the hash is known saved, refreshing its recency.
    pub(crate) fn contains(&mut self, hash: &H256) -> bool {
        self.map.get(hash).is_some()
    }

    /// Remembers the hash as saved.
    pub(crate) fn insert(&mut self, hash: H256) {
        self.map.insert(hash, ());
    }
}

impl std::fmt::Debug for AlreadySavedCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlreadySavedCache").field("len", &self.map.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lith_primitives::keccak256;

    #[test]
    fn evicts_least_recently_used() {
        let mut cache = AlreadySavedCache::new(2);
        let [first, second, third] =
            [keccak256(b"a"), keccak256(b"b"), keccak256(b"c")];

        cache.insert(first);
        cache.insert(second);
        // Touch `first` so `second` is the eviction candidate.
        assert!(cache.contains(&first));
        cache.insert(third);

        assert!(cache.contains(&first));
        assert!(!cache.contains(&second));
        assert!(cache.contains(&third));
    }
}
