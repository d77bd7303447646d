//! Bucket table
//!
//! A power-of-two array of hash chains. The length is validated before a
//! table is built, so bucket selection is a mask of the flow hash.

use alloc::vec::Vec;

use nos_api::Result;

use crate::config::validate_hash_size;
use crate::entry::{FlowArena, FlowIndex, Linkage};
use crate::key::FlowKey;
use crate::list::ListHead;

/// Array of hash chain heads
#[derive(Debug)]
pub struct BucketTable {
    heads: Vec<ListHead>,
}

impl BucketTable {
    /// Allocate a table of `size` empty chains
    ///
    /// Fails with `InvalidConfiguration` for sizes that are not a non-zero
    /// power of two and with `OutOfMemory` when the allocation fails.
    pub fn with_size(size: usize) -> Result<Self> {
        validate_hash_size(size)?;
        let mut heads = Vec::new();
        heads.try_reserve_exact(size)?;
        heads.resize(size, ListHead::new());
        Ok(Self { heads })
    }

    /// Number of buckets
    pub fn len(&self) -> usize {
        self.heads.len()
    }

    /// Always false: a table has at least one bucket
    pub fn is_empty(&self) -> bool {
        self.heads.is_empty()
    }

    /// Bucket `key` hashes to
    pub fn bucket_of(&self, key: &FlowKey) -> usize {
        key.bucket(self.heads.len())
    }

    /// Find the live entry for `key`
    pub fn find<R>(&self, arena: &FlowArena<R>, key: &FlowKey) -> Option<FlowIndex> {
        self.heads[self.bucket_of(key)]
            .iter(arena, Linkage::Chain)
            .find(|&idx| arena.get(idx).is_some_and(|entry| entry.key == *key))
    }

    /// Link `idx` at the head of its key's chain
    pub fn insert<R>(&mut self, arena: &mut FlowArena<R>, idx: FlowIndex) {
        let Some(bucket) = arena.get(idx).map(|entry| self.bucket_of(&entry.key)) else {
            return;
        };
        self.heads[bucket].push_front(arena, Linkage::Chain, idx);
    }

    /// Unlink `idx` from its key's chain
    pub fn remove<R>(&mut self, arena: &mut FlowArena<R>, idx: FlowIndex) {
        let Some(bucket) = arena.get(idx).map(|entry| self.bucket_of(&entry.key)) else {
            return;
        };
        self.heads[bucket].unlink(arena, Linkage::Chain, idx);
    }

    #[cfg(test)]
    fn chain_len<R>(&self, arena: &FlowArena<R>, bucket: usize) -> usize {
        self.heads
            .get(bucket)
            .map_or(0, |head| head.iter(arena, Linkage::Chain).count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::FlowEntry;
    use crate::test_support::{key, TestRoute};
    use nos_api::Error;

    #[test]
    fn test_rejects_bad_sizes() {
        assert!(matches!(BucketTable::with_size(0), Err(Error::InvalidConfiguration(_))));
        assert!(matches!(BucketTable::with_size(100), Err(Error::InvalidConfiguration(_))));
    }

    #[test]
    fn test_allocation_failure() {
        assert!(matches!(BucketTable::with_size(1 << 62), Err(Error::OutOfMemory)));
    }

    #[test]
    fn test_find_insert_remove() {
        let mut table = BucketTable::with_size(4).unwrap();
        let mut arena = FlowArena::new();
        let mut indices = alloc::vec::Vec::new();
        for i in 0..16 {
            let (route, _) = TestRoute::new(1500);
            arena.reserve_slot().unwrap();
            let idx = arena.insert(FlowEntry::new(key(i), route, 10));
            table.insert(&mut arena, idx);
            indices.push(idx);
        }

        for i in 0..16u16 {
            assert_eq!(table.find(&arena, &key(i)), Some(indices[i as usize]));
        }
        let total: usize = (0..table.len()).map(|b| table.chain_len(&arena, b)).sum();
        assert_eq!(total, 16);

        table.remove(&mut arena, indices[5]);
        assert_eq!(table.find(&arena, &key(5)), None);
        assert_eq!(table.find(&arena, &key(6)), Some(indices[6]));
        assert_eq!(table.find(&arena, &key(99)), None);
    }
}
