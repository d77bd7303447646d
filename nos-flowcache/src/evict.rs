//! Capacity eviction
//!
//! Two policies for two contexts. `evict_oldest` runs inside
//! `record_forward` and must stay O(1): it drops the tail of the recency
//! list, which is the least recently *inserted* entry since hits do not
//! move entries. `reap_to_limit` runs when the capacity is lowered and
//! scans the whole list to pick the least valuable entries.

use crate::cache::{FlowCache, FlowTable};
use crate::entry::{FlowIndex, Linkage};
use crate::route::RouteHandle;

impl<R: RouteHandle> FlowTable<R> {
    /// Destroy the tail of the recency list
    pub(crate) fn evict_oldest(&mut self) -> bool {
        let Some(idx) = self.recency.last else {
            return false;
        };
        flow_trace!("evicting oldest flow {}", idx);
        self.destroy(idx)
    }

    /// Pick the next entry the thorough reap should destroy
    ///
    /// The first entry with a stale route wins outright. Otherwise the
    /// smallest expiry countdown, ties broken by the fewest recent uses.
    fn reap_candidate(&self) -> Option<FlowIndex> {
        let mut best: Option<(FlowIndex, u32, u64)> = None;

        for idx in self.recency.iter(&self.arena, Linkage::Recency) {
            let Some(entry) = self.arena.get(idx) else {
                continue;
            };
            if entry.route.validate().is_none() {
                return Some(idx);
            }
            let rank = (entry.expiry, entry.recent_uses());
            if best.is_none_or(|(_, expiry, uses)| rank < (expiry, uses)) {
                best = Some((idx, rank.0, rank.1));
            }
        }
        best.map(|(idx, _, _)| idx)
    }

    /// Destroy entries until `count <= max_flows`
    pub(crate) fn reap_to_limit(&mut self) -> usize {
        let mut reaped = 0;
        while self.count > self.max_flows {
            let Some(idx) = self.reap_candidate() else {
                break;
            };
            if !self.destroy(idx) {
                break;
            }
            reaped += 1;
        }
        reaped
    }
}

impl<R: RouteHandle> FlowCache<R> {
    /// Reclaim one slot by dropping the least recently inserted entry
    pub fn evict_oldest(&self) -> bool {
        self.lock().evict_oldest()
    }

    /// Run the thorough reap against the current capacity limit
    pub fn reap(&self) -> usize {
        self.lock().reap_to_limit()
    }
}
