//! Flow cache configuration
//!
//! Capacity and table-size knobs together with the timing constants of the
//! aging sweep. The runtime surface (`FlowCache::set_max_flows`,
//! `FlowCache::set_hash_size`) validates through the same helpers.

use nos_api::error::{invalid_configuration, Result};
use static_assertions::const_assert;

/// Slow timer ticks per second
pub const SLOW_HZ: u32 = 2;

/// Interval between aging sweeps in milliseconds (one slow tick)
pub const SWEEP_INTERVAL_MS: u64 = 1000 / SLOW_HZ as u64;

/// Sweeps an idle entry survives before it expires
pub const FLOW_TIMER_TICKS: u32 = 5 * SLOW_HZ;

/// Smallest usable expiry countdown
///
/// A hit restarts the countdown and the next sweep takes one tick off it,
/// so a countdown of one would let that sweep reap the entry just hit.
pub const MIN_EXPIRY_TICKS: u32 = 2;

/// Bits folded per round of the flow hash
pub const FLOW_HASH_BITS: u32 = 6;

/// Default bucket table length
pub const DEFAULT_HASH_SIZE: usize = 1 << FLOW_HASH_BITS;

/// Default maximum number of cached flows
pub const DEFAULT_MAX_FLOWS: usize = 256;

const_assert!(DEFAULT_HASH_SIZE.is_power_of_two());
const_assert!(DEFAULT_MAX_FLOWS > 0);
const_assert!(FLOW_TIMER_TICKS >= MIN_EXPIRY_TICKS);

/// Flow cache configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowCacheConfig {
    /// Maximum number of live flows; zero disables caching
    pub max_flows: usize,
    /// Bucket table length, always a non-zero power of two
    pub hash_size: usize,
    /// Countdown an entry is given on insertion and on every hit
    pub expiry_ticks: u32,
}

impl FlowCacheConfig {
    /// Create a configuration with the default values
    pub const fn new() -> Self {
        Self {
            max_flows: DEFAULT_MAX_FLOWS,
            hash_size: DEFAULT_HASH_SIZE,
            expiry_ticks: FLOW_TIMER_TICKS,
        }
    }

    /// Set the capacity limit
    pub const fn with_max_flows(mut self, max_flows: usize) -> Self {
        self.max_flows = max_flows;
        self
    }

    /// Set the bucket table length
    pub const fn with_hash_size(mut self, hash_size: usize) -> Self {
        self.hash_size = hash_size;
        self
    }

    /// Set the expiry countdown
    pub const fn with_expiry_ticks(mut self, expiry_ticks: u32) -> Self {
        self.expiry_ticks = expiry_ticks;
        self
    }

    /// Check the configuration for values the cache cannot run with
    pub fn validate(&self) -> Result<()> {
        validate_hash_size(self.hash_size)?;
        if self.expiry_ticks < MIN_EXPIRY_TICKS {
            return Err(invalid_configuration("expiry ticks must be at least two sweeps"));
        }
        Ok(())
    }
}

impl Default for FlowCacheConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Reject bucket table lengths that cannot be mask-indexed
pub fn validate_hash_size(hash_size: usize) -> Result<()> {
    if !hash_size.is_power_of_two() {
        return Err(invalid_configuration("hash size must be a non-zero power of two"));
    }
    Ok(())
}
