//! IPv6 fast-forwarding flow cache
//!
//! `FlowCache` owns the bucket table, the recency list and the entry arena
//! behind a single lock. `try_forward` is the fast path run for every
//! received datagram; `record_forward` is called by the slow path once the
//! full routing lookup has picked a route, so that later datagrams of the
//! same flow can take the fast path.
//!
//! Entries are only ever removed by `record_forward` (replacement or
//! capacity eviction), by the sweep, by a capacity reduction and by
//! `invalidate_all`. The fast path never unlinks anything: a stale route
//! found there is reported as a miss and left for the next sweep.

use alloc::sync::Arc;
use alloc::vec::Vec;

use nos_api::net::{
    Ipv6Header, LinkFlags, Packet, HOP_BY_HOP, HOP_LIMIT_DECREMENT, ICMPV6, IPV6_VERSION,
};
use nos_api::sync::{Mutex, MutexGuard};
use nos_api::Result;

use crate::config::{validate_hash_size, FlowCacheConfig};
use crate::entry::{FlowArena, FlowEntry, FlowIndex, Linkage};
use crate::key::FlowKey;
use crate::list::ListHead;
use crate::route::{RouteHandle, Transmit, TransmitError};
use crate::stats::FlowStatsSink;
use crate::table::BucketTable;

/// Result of a fast-path forwarding attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardOutcome {
    /// Handed to the transmit primitive, which accepted it
    Forwarded,
    /// Handed to the transmit primitive, which rejected it; the datagram
    /// was consumed either way
    Dropped(TransmitError),
    /// Not handled; the caller must run the full routing lookup
    NotCached,
}

/// Diagnostic copy of one live entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowSnapshot {
    pub key: FlowKey,
    pub uses: u64,
    pub last_uses: u64,
    pub forwarded: u64,
    pub dropped: u64,
    pub expiry: u32,
}

impl FlowSnapshot {
    fn of<R>(entry: &FlowEntry<R>) -> Self {
        Self {
            key: entry.key,
            uses: entry.uses,
            last_uses: entry.last_uses,
            forwarded: entry.forwarded,
            dropped: entry.dropped,
            expiry: entry.expiry,
        }
    }
}

/// State guarded by the cache lock
pub(crate) struct FlowTable<R: RouteHandle> {
    pub(crate) arena: FlowArena<R>,
    pub(crate) buckets: BucketTable,
    /// Every live entry, most recently inserted first
    pub(crate) recency: ListHead,
    pub(crate) count: usize,
    pub(crate) max_flows: usize,
    pub(crate) expiry_ticks: u32,
    pub(crate) stats: Arc<dyn FlowStatsSink>,
}

impl<R: RouteHandle> FlowTable<R> {
    pub(crate) fn lookup(&self, key: &FlowKey) -> Option<FlowIndex> {
        self.buckets.find(&self.arena, key)
    }

    /// Put `idx` at the head of its chain and of the recency list
    pub(crate) fn link(&mut self, idx: FlowIndex) {
        self.buckets.insert(&mut self.arena, idx);
        self.recency.push_front(&mut self.arena, Linkage::Recency, idx);
    }

    /// Take `idx` off its chain and the recency list
    pub(crate) fn unlink(&mut self, idx: FlowIndex) {
        self.buckets.remove(&mut self.arena, idx);
        self.recency.unlink(&mut self.arena, Linkage::Recency, idx);
    }

    /// Merge the counters of `idx` into the aggregates
    pub(crate) fn flush(&self, idx: FlowIndex) {
        if let Some(entry) = self.arena.get(idx) {
            flush_entry(&*self.stats, entry);
        }
    }

    /// Unlink, flush, release and free one entry
    pub(crate) fn destroy(&mut self, idx: FlowIndex) -> bool {
        self.unlink(idx);
        let Some(entry) = self.arena.remove(idx) else {
            return false;
        };
        flush_entry(&*self.stats, &entry);
        entry.route.release();
        self.count -= 1;
        self.stats.set_flow_count(self.count);
        true
    }

    /// Destroy every live entry
    pub(crate) fn destroy_all(&mut self) -> usize {
        let mut destroyed = 0;
        while let Some(idx) = self.recency.first {
            if !self.destroy(idx) {
                break;
            }
            destroyed += 1;
        }
        destroyed
    }
}

fn flush_entry<R: RouteHandle>(stats: &dyn FlowStatsSink, entry: &FlowEntry<R>) {
    if entry.uses > 0 && entry.route.validate().is_some() {
        entry.route.note_uses(entry.uses);
    }
    stats.flush(&entry.counters());
}

/// Hash-indexed cache of forwarding decisions
pub struct FlowCache<R: RouteHandle> {
    table: Mutex<FlowTable<R>>,
}

impl<R: RouteHandle> FlowCache<R> {
    /// Create an empty cache
    pub fn new(config: FlowCacheConfig, stats: Arc<dyn FlowStatsSink>) -> Result<Self> {
        config.validate()?;
        let buckets = BucketTable::with_size(config.hash_size)?;
        stats.set_flow_count(0);

        flow_debug!(
            "flow cache: {} buckets, up to {} flows",
            config.hash_size,
            config.max_flows
        );

        Ok(Self {
            table: Mutex::new(FlowTable {
                arena: FlowArena::new(),
                buckets,
                recency: ListHead::new(),
                count: 0,
                max_flows: config.max_flows,
                expiry_ticks: config.expiry_ticks,
                stats,
            }),
        })
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, FlowTable<R>> {
        self.table.lock()
    }

    /// Number of live flows
    pub fn flow_count(&self) -> usize {
        self.lock().count
    }

    /// Whether a live entry exists for `key`
    pub fn contains(&self, key: &FlowKey) -> bool {
        self.lock().lookup(key).is_some()
    }

    /// Counters and countdown of the entry for `key`
    pub fn snapshot(&self, key: &FlowKey) -> Option<FlowSnapshot> {
        let table = self.lock();
        let idx = table.lookup(key)?;
        table.arena.get(idx).map(FlowSnapshot::of)
    }

    /// All live entries, most recently inserted first
    pub fn flows(&self) -> Vec<FlowSnapshot> {
        let table = self.lock();
        table
            .recency
            .iter(&table.arena, Linkage::Recency)
            .filter_map(|idx| table.arena.get(idx))
            .map(FlowSnapshot::of)
            .collect()
    }

    /// Capacity limit
    pub fn max_flows(&self) -> usize {
        self.lock().max_flows
    }

    /// Change the capacity limit
    ///
    /// Lowering the limit reaps entries until the cache fits; zero disables
    /// caching and empties the cache. Returns the number of entries reaped.
    pub fn set_max_flows(&self, max_flows: usize) -> usize {
        let mut table = self.lock();
        table.max_flows = max_flows;
        let reaped = table.reap_to_limit();
        flow_info!("flow cache limit set to {}, {} flows reaped", max_flows, reaped);
        reaped
    }

    /// Bucket table length
    pub fn hash_size(&self) -> usize {
        self.lock().buckets.len()
    }

    /// Change the bucket table length
    ///
    /// Non-power-of-two sizes are rejected without side effects. Otherwise
    /// the cache is emptied and the table rebuilt at the new size.
    pub fn set_hash_size(&self, hash_size: usize) -> Result<()> {
        self.invalidate_all(Some(hash_size))
    }

    /// Forward `packet` from the cache if its flow is known
    ///
    /// Every miss returns `NotCached` without touching cache state. A hit
    /// decrements the hop limit, restarts the entry's expiry countdown and
    /// hands the packet to `tx` while the cache lock is held.
    pub fn try_forward<T>(&self, packet: &mut Packet, tx: &mut T) -> ForwardOutcome
    where
        T: Transmit<R::Interface> + ?Sized,
    {
        let mut guard = self.lock();
        let table = &mut *guard;

        if table.max_flows == 0 || table.count == 0 {
            return ForwardOutcome::NotCached;
        }
        if packet.link.intersects(LinkFlags::BROADCAST | LinkFlags::MULTICAST) {
            return ForwardOutcome::NotCached;
        }
        if packet.header.next_header == HOP_BY_HOP {
            return ForwardOutcome::NotCached;
        }
        if packet.header.version() != IPV6_VERSION {
            return ForwardOutcome::NotCached;
        }

        let key = FlowKey::from_header(&packet.header);
        let Some(idx) = table.lookup(&key) else {
            return ForwardOutcome::NotCached;
        };
        let expiry = table.expiry_ticks;
        let Some(entry) = table.arena.get_mut(idx) else {
            return ForwardOutcome::NotCached;
        };

        // Stale entries stay linked until the sweep reaps them
        let Some(route) = entry.route.validate() else {
            flow_trace!("flow {}: route stale", key);
            return ForwardOutcome::NotCached;
        };
        if packet.len() > route.mtu {
            return ForwardOutcome::NotCached;
        }
        if packet.header.hop_limit <= HOP_LIMIT_DECREMENT {
            return ForwardOutcome::NotCached;
        }

        packet.header.hop_limit -= HOP_LIMIT_DECREMENT;
        entry.expiry = expiry;
        entry.uses += 1;

        let next_hop = route.next_hop(packet.header.dst);
        match tx.send(&route.interface, packet, next_hop, &route) {
            Ok(()) => {
                entry.forwarded += 1;
                ForwardOutcome::Forwarded
            }
            Err(err) => {
                flow_trace!("flow {}: transmit failed: {}", key, err);
                entry.dropped += 1;
                ForwardOutcome::Dropped(err)
            }
        }
    }

    /// Memoize the slow path's decision to forward `header`'s flow via `route`
    ///
    /// An existing entry for the flow is flushed and re-populated in place.
    /// A new entry may evict the oldest one when the cache is full. When
    /// nothing is cached (caching disabled, ICMPv6, allocation failure) the
    /// route handle is released and `false` is returned.
    pub fn record_forward(&self, header: &Ipv6Header, route: R) -> bool {
        let mut table = self.lock();

        if table.max_flows == 0 || header.next_header == ICMPV6 {
            route.release();
            return false;
        }

        let key = FlowKey::from_header(header);
        let expiry = table.expiry_ticks;

        match table.lookup(&key) {
            Some(idx) => {
                table.unlink(idx);
                table.flush(idx);
                if let Some(entry) = table.arena.get_mut(idx) {
                    let previous = core::mem::replace(&mut entry.route, route);
                    previous.release();
                    entry.clear_counters();
                    entry.last_uses = 0;
                    entry.expiry = expiry;
                }
                table.link(idx);
                flow_trace!("flow {}: route replaced", key);
            }
            None => {
                if table.count >= table.max_flows && !table.evict_oldest() {
                    route.release();
                    return false;
                }
                if table.arena.reserve_slot().is_err() {
                    flow_debug!("flow {}: entry allocation failed, not cached", key);
                    table.stats.note_alloc_failure();
                    route.release();
                    return false;
                }
                let idx = table.arena.insert(FlowEntry::new(key, route, expiry));
                table.count += 1;
                table.link(idx);
                table.stats.set_flow_count(table.count);
                flow_trace!("flow {}: cached", key);
            }
        }
        true
    }

    /// Destroy every entry, optionally rebuilding the table at `new_size`
    ///
    /// A `new_size` that is not a non-zero power of two is rejected before
    /// anything is touched. If the new table cannot be allocated the cache
    /// is still emptied, the old table is kept and `OutOfMemory` returned.
    pub fn invalidate_all(&self, new_size: Option<usize>) -> Result<()> {
        if let Some(size) = new_size {
            validate_hash_size(size)?;
        }

        let mut table = self.lock();
        let flushed = table.destroy_all();
        flow_info!("flow cache invalidated, {} flows flushed", flushed);

        if let Some(size) = new_size {
            match BucketTable::with_size(size) {
                Ok(buckets) => {
                    table.buckets = buckets;
                    flow_info!("flow cache table resized to {} buckets", size);
                }
                Err(err) => {
                    flow_warn!("flow cache resize to {} failed: {}", size, err);
                    return Err(err);
                }
            }
        }
        Ok(())
    }
}
