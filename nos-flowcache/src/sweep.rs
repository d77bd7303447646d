//! Periodic aging sweep and its scheduler
//!
//! The sweep is the only place entries are removed for being idle or for
//! holding a stale route. It is driven by a slow timer through
//! `SweepScheduler`, which keeps at most one sweep task outstanding no
//! matter how many ticks fire while one is pending.

use alloc::boxed::Box;
use alloc::sync::Arc;

use nos_api::sync::{AtomicBool, AtomicU64, Ordering};

use crate::cache::{FlowCache, FlowTable};
use crate::entry::Linkage;
use crate::list::ListHead;
use crate::route::RouteHandle;

/// What one sweep did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SweepReport {
    /// Entries whose countdown ran out
    pub expired: usize,
    /// Entries whose route went stale
    pub stale: usize,
    /// Entries aged and kept
    pub retained: usize,
}

impl SweepReport {
    /// Entries destroyed by the sweep
    pub fn reaped(&self) -> usize {
        self.expired + self.stale
    }
}

impl<R: RouteHandle> FlowTable<R> {
    pub(crate) fn sweep(&mut self) -> SweepReport {
        let mut report = SweepReport::default();
        let mut cursor = self.recency.first;

        while let Some(idx) = cursor {
            cursor = ListHead::next(&self.arena, Linkage::Recency, idx);
            let Some(entry) = self.arena.get_mut(idx) else {
                continue;
            };

            let expired = entry.tick_expired();
            let stale = entry.route.validate().is_none();
            if expired || stale {
                if self.destroy(idx) {
                    if expired {
                        report.expired += 1;
                    } else {
                        report.stale += 1;
                    }
                }
                continue;
            }

            entry.last_uses = entry.uses;
            let counters = entry.counters();
            if entry.uses > 0 {
                entry.route.note_uses(entry.uses);
            }
            entry.clear_counters();
            self.stats.flush(&counters);
            report.retained += 1;
        }

        flow_debug!(
            "flow sweep: {} expired, {} stale, {} retained",
            report.expired,
            report.stale,
            report.retained
        );
        report
    }
}

impl<R: RouteHandle> FlowCache<R> {
    /// Age every entry and destroy the expired and stale ones
    pub fn sweep(&self) -> SweepReport {
        self.lock().sweep()
    }
}

/// Deferred execution context supplied by the host
pub trait WorkQueue {
    /// Run `job` later, outside the caller's context
    fn enqueue(&self, job: Box<dyn FnOnce() + Send>);
}

/// Single-flight driver for `FlowCache::sweep`
pub struct SweepScheduler<R: RouteHandle> {
    cache: Arc<FlowCache<R>>,
    enqueued: AtomicBool,
    runs: AtomicU64,
}

impl<R: RouteHandle> SweepScheduler<R> {
    pub fn new(cache: Arc<FlowCache<R>>) -> Self {
        Self {
            cache,
            enqueued: AtomicBool::new(false),
            runs: AtomicU64::new(0),
        }
    }

    /// Cache this scheduler sweeps
    pub fn cache(&self) -> &Arc<FlowCache<R>> {
        &self.cache
    }

    /// Timer tick: request a sweep
    ///
    /// Returns `true` if this tick enqueued a new sweep task, `false` if one
    /// was already pending. The caller is responsible for arranging that
    /// `run_pending` is eventually called after a `true` return.
    pub fn tick(&self) -> bool {
        !self.enqueued.swap(true, Ordering::AcqRel)
    }

    /// Whether a sweep task is enqueued and has not started
    pub fn is_pending(&self) -> bool {
        self.enqueued.load(Ordering::Acquire)
    }

    /// Body of the deferred sweep task
    ///
    /// The pending flag is cleared before the sweep starts, so ticks that
    /// arrive while it runs enqueue exactly one follow-up. Returns `None`
    /// when no task was pending.
    pub fn run_pending(&self) -> Option<SweepReport> {
        if !self.enqueued.swap(false, Ordering::AcqRel) {
            return None;
        }
        let report = self.cache.sweep();
        self.runs.fetch_add(1, Ordering::Relaxed);
        Some(report)
    }

    /// Number of sweeps executed through this scheduler
    pub fn sweeps_run(&self) -> u64 {
        self.runs.load(Ordering::Relaxed)
    }
}

impl<R: RouteHandle + 'static> SweepScheduler<R> {
    /// Timer tick that hands a newly enqueued task to `queue`
    pub fn tick_with(self: &Arc<Self>, queue: &dyn WorkQueue) -> bool {
        if !self.tick() {
            return false;
        }
        let scheduler = Arc::clone(self);
        queue.enqueue(Box::new(move || {
            scheduler.run_pending();
        }));
        true
    }
}
