//! Flow entries and the arena that stores them
//!
//! Entries are addressed by `FlowIndex` rather than by pointer. Each entry
//! carries the neighbor indices for the two lists it is threaded on (its
//! hash chain and the recency list), which keeps unlinking O(1) without any
//! shared ownership between entries.

use alloc::vec::Vec;

use nos_api::{Error, Result};

use crate::key::FlowKey;
use crate::route::RouteHandle;
use crate::stats::FlowCounters;

/// Index of an entry slot in the arena
pub type FlowIndex = u32;

/// Neighbor indices on one list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Link {
    pub prev: Option<FlowIndex>,
    pub next: Option<FlowIndex>,
}

/// Which of the two lists an operation refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Linkage {
    /// The hash chain of the entry's bucket
    Chain,
    /// The recency list of all live entries
    Recency,
}

/// A cached forwarding decision
#[derive(Debug)]
pub struct FlowEntry<R> {
    /// Flow this entry forwards
    pub key: FlowKey,
    /// Route chosen by the slow path
    pub route: R,
    /// Hits in the current sweep interval
    pub uses: u64,
    /// Hits in the previous sweep interval
    pub last_uses: u64,
    /// Hits the transmit primitive accepted
    pub forwarded: u64,
    /// Hits the transmit primitive rejected
    pub dropped: u64,
    /// Sweeps left before the entry expires
    pub expiry: u32,
    chain: Link,
    recency: Link,
}

impl<R: RouteHandle> FlowEntry<R> {
    /// Create an unlinked entry with zeroed counters
    pub fn new(key: FlowKey, route: R, expiry: u32) -> Self {
        Self {
            key,
            route,
            uses: 0,
            last_uses: 0,
            forwarded: 0,
            dropped: 0,
            expiry,
            chain: Link::default(),
            recency: Link::default(),
        }
    }

    /// Counters to hand to the statistics sink
    pub fn counters(&self) -> FlowCounters {
        FlowCounters {
            uses: self.uses,
            forwarded: self.forwarded,
            dropped: self.dropped,
        }
    }

    /// Zero the current-interval counters
    pub fn clear_counters(&mut self) {
        self.uses = 0;
        self.forwarded = 0;
        self.dropped = 0;
    }

    /// Advance the expiry countdown by one sweep
    ///
    /// Returns `true` when the countdown reaches zero on this call. A
    /// countdown that is already zero never expires.
    pub fn tick_expired(&mut self) -> bool {
        if self.expiry == 0 {
            return false;
        }
        self.expiry -= 1;
        self.expiry == 0
    }

    /// Combined uses over the current and previous interval
    pub fn recent_uses(&self) -> u64 {
        self.uses.saturating_add(self.last_uses)
    }
}

impl<R> FlowEntry<R> {
    /// Neighbor indices on the given list
    pub fn link(&self, which: Linkage) -> &Link {
        match which {
            Linkage::Chain => &self.chain,
            Linkage::Recency => &self.recency,
        }
    }

    /// Mutable neighbor indices on the given list
    pub fn link_mut(&mut self, which: Linkage) -> &mut Link {
        match which {
            Linkage::Chain => &mut self.chain,
            Linkage::Recency => &mut self.recency,
        }
    }
}

/// Slot storage for entries with a free list of vacated slots
#[derive(Debug)]
pub struct FlowArena<R> {
    slots: Vec<Option<FlowEntry<R>>>,
    free: Vec<FlowIndex>,
    len: usize,
    /// Occupancy at which `reserve_slot` reports exhaustion
    #[cfg(test)]
    slot_limit: Option<usize>,
}

impl<R> FlowArena<R> {
    /// Create an empty arena
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
            #[cfg(test)]
            slot_limit: None,
        }
    }

    /// Number of occupied slots
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no slot is occupied
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Make sure the next `insert` will not need to allocate
    ///
    /// Fails with `OutOfMemory` when the slot storage cannot grow.
    pub fn reserve_slot(&mut self) -> Result<()> {
        if self.exhausted() {
            return Err(Error::OutOfMemory);
        }
        if !self.free.is_empty() {
            return Ok(());
        }
        self.slots.try_reserve(1)?;
        // `remove` pushes onto the free list; keep that infallible too
        self.free.try_reserve(self.slots.len() + 1 - self.free.len())?;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn set_slot_limit(&mut self, limit: usize) {
        self.slot_limit = Some(limit);
    }

    #[cfg(test)]
    fn exhausted(&self) -> bool {
        self.slot_limit.is_some_and(|limit| self.len >= limit)
    }

    #[cfg(not(test))]
    fn exhausted(&self) -> bool {
        false
    }

    /// Store an entry
    ///
    /// Callers must have succeeded in `reserve_slot` first.
    pub fn insert(&mut self, entry: FlowEntry<R>) -> FlowIndex {
        self.len += 1;
        match self.free.pop() {
            Some(idx) => {
                self.slots[idx as usize] = Some(entry);
                idx
            }
            None => {
                let idx = self.slots.len() as FlowIndex;
                self.slots.push(Some(entry));
                idx
            }
        }
    }

    /// Take an entry out of its slot, leaving the slot free for reuse
    pub fn remove(&mut self, idx: FlowIndex) -> Option<FlowEntry<R>> {
        let entry = self.slots.get_mut(idx as usize)?.take()?;
        self.free.push(idx);
        self.len -= 1;
        Some(entry)
    }

    /// Borrow an entry
    pub fn get(&self, idx: FlowIndex) -> Option<&FlowEntry<R>> {
        self.slots.get(idx as usize)?.as_ref()
    }

    /// Mutably borrow an entry
    pub fn get_mut(&mut self, idx: FlowIndex) -> Option<&mut FlowEntry<R>> {
        self.slots.get_mut(idx as usize)?.as_mut()
    }
}

impl<R> Default for FlowArena<R> {
    fn default() -> Self {
        Self::new()
    }
}
