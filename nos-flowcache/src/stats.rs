//! Flow statistics
//!
//! Entries count locally and flush into a process-wide sink when they are
//! aged by the sweep or destroyed, so the fast path only touches the entry
//! it already holds.

use nos_api::sync::{AtomicU64, AtomicUsize, Ordering};

/// Counters flushed from one entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlowCounters {
    /// Fast-path hits since the last flush
    pub uses: u64,
    /// Hits the transmit primitive accepted
    pub forwarded: u64,
    /// Hits the transmit primitive rejected
    pub dropped: u64,
}

impl FlowCounters {
    /// Whether nothing was counted
    pub fn is_zero(&self) -> bool {
        self.uses == 0 && self.forwarded == 0 && self.dropped == 0
    }
}

/// Destination of flushed per-flow counters
pub trait FlowStatsSink: Send + Sync {
    /// Merge one entry's counters into the aggregates
    fn flush(&self, counters: &FlowCounters);

    /// Current number of live flows
    fn set_flow_count(&self, count: usize);

    /// An entry could not be allocated and the flow was not cached
    fn note_alloc_failure(&self) {}
}

/// Process-wide IPv6 forwarding counters fed by the flow cache
#[derive(Debug, Default)]
pub struct FlowStats {
    /// Datagrams seen by the fast path
    total: AtomicU64,
    /// Datagrams forwarded
    forward: AtomicU64,
    /// Datagrams forwarded by the fast path
    fastforward: AtomicU64,
    /// Datagrams that could not be forwarded
    cantforward: AtomicU64,
    /// Datagrams dropped on output
    odropped: AtomicU64,
    /// Flushes of cached flows
    fastforwardflows: AtomicU64,
    /// Live flow gauge
    flows: AtomicUsize,
    /// Entry allocations that failed
    alloc_failures: AtomicU64,
}

impl FlowStats {
    /// Create zeroed statistics
    pub const fn new() -> Self {
        Self {
            total: AtomicU64::new(0),
            forward: AtomicU64::new(0),
            fastforward: AtomicU64::new(0),
            cantforward: AtomicU64::new(0),
            odropped: AtomicU64::new(0),
            fastforwardflows: AtomicU64::new(0),
            flows: AtomicUsize::new(0),
            alloc_failures: AtomicU64::new(0),
        }
    }

    /// Read all counters
    pub fn snapshot(&self) -> FlowStatsSnapshot {
        FlowStatsSnapshot {
            total: self.total.load(Ordering::Relaxed),
            forward: self.forward.load(Ordering::Relaxed),
            fastforward: self.fastforward.load(Ordering::Relaxed),
            cantforward: self.cantforward.load(Ordering::Relaxed),
            odropped: self.odropped.load(Ordering::Relaxed),
            fastforwardflows: self.fastforwardflows.load(Ordering::Relaxed),
            flows: self.flows.load(Ordering::Relaxed),
            alloc_failures: self.alloc_failures.load(Ordering::Relaxed),
        }
    }
}

impl FlowStatsSink for FlowStats {
    fn flush(&self, counters: &FlowCounters) {
        self.fastforwardflows.fetch_add(1, Ordering::Relaxed);
        self.total.fetch_add(counters.uses, Ordering::Relaxed);
        self.forward.fetch_add(counters.forwarded, Ordering::Relaxed);
        self.fastforward.fetch_add(counters.forwarded, Ordering::Relaxed);
        self.cantforward.fetch_add(counters.dropped, Ordering::Relaxed);
        self.odropped.fetch_add(counters.dropped, Ordering::Relaxed);
    }

    fn set_flow_count(&self, count: usize) {
        self.flows.store(count, Ordering::Relaxed);
    }

    fn note_alloc_failure(&self) {
        self.alloc_failures.fetch_add(1, Ordering::Relaxed);
    }
}

/// Point-in-time copy of `FlowStats`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlowStatsSnapshot {
    pub total: u64,
    pub forward: u64,
    pub fastforward: u64,
    pub cantforward: u64,
    pub odropped: u64,
    pub fastforwardflows: u64,
    pub flows: usize,
    pub alloc_failures: u64,
}
