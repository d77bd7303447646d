//! Flow key and hash
//!
//! A flow is identified by the exact (source, destination, flow label)
//! triple of an IPv6 header. There is no prefix or wildcard matching.

use core::fmt;
use core::net::Ipv6Addr;

use nos_api::net::{Ipv6Header, FLOW_LABEL_MASK};

use crate::config::FLOW_HASH_BITS;

/// 20-bit IPv6 flow label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FlowLabel(u32);

impl FlowLabel {
    /// Create a flow label, discarding bits above the low 20
    pub const fn new(label: u32) -> Self {
        Self(label & FLOW_LABEL_MASK)
    }

    /// Get the label value
    pub const fn get(self) -> u32 {
        self.0
    }
}

/// Exact-match key of a cached flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FlowKey {
    /// Source address
    pub src: Ipv6Addr,
    /// Destination address
    pub dst: Ipv6Addr,
    /// Flow label
    pub flow: FlowLabel,
}

impl FlowKey {
    /// Create a new flow key
    pub const fn new(src: Ipv6Addr, dst: Ipv6Addr, flow: FlowLabel) -> Self {
        Self { src, dst, flow }
    }

    /// Extract the key of the flow a header belongs to
    pub fn from_header(header: &Ipv6Header) -> Self {
        Self::new(header.src, header.dst, FlowLabel::new(header.flow_label()))
    }

    /// Flow hash
    ///
    /// Each address is summed as four 32-bit words, then shifted slices of
    /// both sums are folded into the flow label.
    pub fn flow_hash(&self) -> u32 {
        let src_sum = word_sum(&self.src);
        let dst_sum = word_sum(&self.dst);

        let mut hash = self.flow.get();
        let mut shift = 0;
        while shift < 32 {
            hash = hash
                .wrapping_add(dst_sum.checked_shr(32 - shift).unwrap_or(0))
                .wrapping_add(src_sum >> shift);
            shift += FLOW_HASH_BITS;
        }
        hash
    }

    /// Bucket index in a table of `table_len` chains (a power of two)
    pub fn bucket(&self, table_len: usize) -> usize {
        debug_assert!(table_len.is_power_of_two());
        self.flow_hash() as usize & (table_len - 1)
    }
}

impl fmt::Display for FlowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} flow {:#07x}", self.src, self.dst, self.flow.get())
    }
}

fn word_sum(addr: &Ipv6Addr) -> u32 {
    addr.octets()
        .chunks_exact(4)
        .map(|w| u32::from_be_bytes([w[0], w[1], w[2], w[3]]))
        .fold(0u32, u32::wrapping_add)
}
