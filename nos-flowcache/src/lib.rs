//! NOS Flow Cache - IPv6 fast-forwarding flow cache
//!
//! This crate memoizes forwarding decisions made by the full IPv6 routing
//! lookup so that steady-state traffic between the same pair of endpoints
//! can be forwarded without consulting the routing table again.
//!
//! # Architecture
//!
//! - **Key**: `FlowKey` (source, destination, 20-bit flow label) and its hash
//! - **Entry**: `FlowEntry` records stored in an index-addressed arena
//! - **List**: intrusive doubly-linked lists threaded through the arena,
//!   used both for hash chains and for the recency list
//! - **Table**: power-of-two bucket table of hash chains
//! - **Cache**: `FlowCache`, the lock-protected owner of all of the above,
//!   with the fast path (`try_forward`) and the slow-path hook
//!   (`record_forward`)
//! - **Evict**: fast tail eviction and the thorough reap used when the
//!   capacity is lowered
//! - **Sweep**: periodic aging and the single-flight `SweepScheduler`
//! - **Route** / **Stats**: the collaborator traits the cache talks to
//!
//! All structural state lives behind one `spin::Mutex`. The transmit
//! primitive is called with that lock held and must not block or re-enter
//! the cache.
//!
//! # Usage
//!
//! ```rust,ignore
//! use alloc::sync::Arc;
//! use nos_flowcache::{FlowCache, FlowCacheConfig, FlowStats, ForwardOutcome};
//!
//! let stats = Arc::new(FlowStats::new());
//! let cache = FlowCache::new(FlowCacheConfig::default(), stats)?;
//!
//! // Slow path, after the routing table picked `route` for `packet`:
//! cache.record_forward(&packet.header, route);
//!
//! // Fast path for the next packet of the same flow:
//! match cache.try_forward(&mut packet, &mut driver) {
//!     ForwardOutcome::NotCached => { /* full routing lookup */ }
//!     _ => { /* consumed */ }
//! }
//! ```

#![no_std]

#[cfg(feature = "std")]
extern crate std;

extern crate alloc;

#[macro_use]
mod logging;

pub mod cache;
pub mod config;
pub mod entry;
pub mod evict;
pub mod key;
pub mod list;
pub mod route;
pub mod stats;
pub mod sweep;
pub mod table;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use cache::{FlowCache, FlowSnapshot, ForwardOutcome};
pub use config::FlowCacheConfig;
pub use key::{FlowKey, FlowLabel};
pub use route::{RouteHandle, RouteInfo, Transmit, TransmitError};
pub use stats::{FlowCounters, FlowStats, FlowStatsSink, FlowStatsSnapshot};
pub use sweep::{SweepReport, SweepScheduler, WorkQueue};
