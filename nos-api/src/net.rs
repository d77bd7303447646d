//! Network-layer types shared by the forwarding code
//!
//! Parsing and building of full packets is done by the protocol stack; this
//! module only carries the IPv6 fixed header and the reception metadata that
//! forwarding decisions depend on.

use alloc::vec::Vec;
use core::net::Ipv6Addr;

use bitflags::bitflags;

/// IP version carried in the upper nibble of the first header word
pub const IPV6_VERSION: u8 = 6;

/// Next-header value for the hop-by-hop options extension
pub const HOP_BY_HOP: u8 = 0;

/// Next-header value for ICMPv6
pub const ICMPV6: u8 = 58;

/// Amount subtracted from the hop limit by a forwarding node
pub const HOP_LIMIT_DECREMENT: u8 = 1;

/// Mask of the 20-bit flow label inside the first header word
pub const FLOW_LABEL_MASK: u32 = 0x000F_FFFF;

bitflags! {
    /// How a frame was addressed at the link layer when it was received
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct LinkFlags: u8 {
        /// Received as a link-layer broadcast
        const BROADCAST = 1 << 0;
        /// Received as a link-layer multicast
        const MULTICAST = 1 << 1;
    }
}

/// Header parsing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderError {
    /// Fewer bytes than the fixed header size
    Truncated,
}

/// IPv6 fixed header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv6Header {
    /// Version (4 bits) + Traffic Class (8 bits) + Flow Label (20 bits)
    pub version_class_flow: u32,
    /// Payload Length (excludes this header)
    pub payload_len: u16,
    /// Next Header
    pub next_header: u8,
    /// Hop Limit
    pub hop_limit: u8,
    /// Source Address
    pub src: Ipv6Addr,
    /// Destination Address
    pub dst: Ipv6Addr,
}

impl Ipv6Header {
    /// Header size in bytes
    pub const SIZE: usize = 40;

    /// Create a new IPv6 header
    pub fn new(
        src: Ipv6Addr,
        dst: Ipv6Addr,
        flow_label: u32,
        next_header: u8,
        payload_len: u16,
        hop_limit: u8,
    ) -> Self {
        Self {
            version_class_flow: ((IPV6_VERSION as u32) << 28) | (flow_label & FLOW_LABEL_MASK),
            payload_len,
            next_header,
            hop_limit,
            src,
            dst,
        }
    }

    /// Get the version
    pub fn version(&self) -> u8 {
        (self.version_class_flow >> 28) as u8
    }

    /// Get the traffic class
    pub fn traffic_class(&self) -> u8 {
        (self.version_class_flow >> 20) as u8
    }

    /// Get the 20-bit flow label
    pub fn flow_label(&self) -> u32 {
        self.version_class_flow & FLOW_LABEL_MASK
    }

    /// Total datagram length including this header
    pub fn total_len(&self) -> usize {
        Self::SIZE + self.payload_len as usize
    }

    /// Parse the fixed header from the start of `bytes`
    ///
    /// The version nibble is not validated here.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, HeaderError> {
        if bytes.len() < Self::SIZE {
            return Err(HeaderError::Truncated);
        }

        let mut src = [0u8; 16];
        let mut dst = [0u8; 16];
        src.copy_from_slice(&bytes[8..24]);
        dst.copy_from_slice(&bytes[24..40]);

        Ok(Self {
            version_class_flow: u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            payload_len: u16::from_be_bytes([bytes[4], bytes[5]]),
            next_header: bytes[6],
            hop_limit: bytes[7],
            src: Ipv6Addr::from(src),
            dst: Ipv6Addr::from(dst),
        })
    }

    /// Serialize header to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..4].copy_from_slice(&self.version_class_flow.to_be_bytes());
        bytes[4..6].copy_from_slice(&self.payload_len.to_be_bytes());
        bytes[6] = self.next_header;
        bytes[7] = self.hop_limit;
        bytes[8..24].copy_from_slice(&self.src.octets());
        bytes[24..40].copy_from_slice(&self.dst.octets());
        bytes
    }
}

/// A received datagram on its way through the forwarding path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Parsed network-layer header, mutable so forwarding can age it
    pub header: Ipv6Header,
    /// Link-layer reception flags
    pub link: LinkFlags,
    /// Everything after the fixed header
    pub payload: Vec<u8>,
}

impl Packet {
    /// Create a new packet
    pub fn new(header: Ipv6Header, link: LinkFlags, payload: Vec<u8>) -> Self {
        Self { header, link, payload }
    }

    /// Total network-layer length as advertised by the header
    pub fn len(&self) -> usize {
        self.header.total_len()
    }

    /// Whether the datagram carries no payload
    pub fn is_empty(&self) -> bool {
        self.header.payload_len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_fields() {
        let header = Ipv6Header::new(
            Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 1),
            Ipv6Addr::new(0x2001, 0xdb8, 0, 1, 0, 0, 0, 2),
            0x1_2345,
            17,
            1200,
            64,
        );
        assert_eq!(header.version(), IPV6_VERSION);
        assert_eq!(header.traffic_class(), 0);
        assert_eq!(header.flow_label(), 0x1_2345);
        assert_eq!(header.total_len(), 1240);
    }

    #[test]
    fn test_flow_label_is_masked() {
        let header = Ipv6Header::new(
            Ipv6Addr::LOCALHOST,
            Ipv6Addr::LOCALHOST,
            0xFFF0_0001,
            17,
            0,
            1,
        );
        assert_eq!(header.flow_label(), 0x0_0001);
        assert_eq!(header.version(), IPV6_VERSION);
    }

    #[test]
    fn test_parse_wire_header() {
        let mut bytes = [0u8; 48];
        bytes[0] = 0x6a;
        bytes[1] = 0xb1;
        bytes[2] = 0x23;
        bytes[3] = 0x45;
        bytes[5] = 8;
        bytes[6] = ICMPV6;
        bytes[7] = 255;
        bytes[23] = 1;
        bytes[39] = 2;

        let header = Ipv6Header::from_bytes(&bytes).unwrap();
        assert_eq!(header.version(), 6);
        assert_eq!(header.traffic_class(), 0xab);
        assert_eq!(header.flow_label(), 0x1_2345);
        assert_eq!(header.payload_len, 8);
        assert_eq!(header.next_header, ICMPV6);
        assert_eq!(header.hop_limit, 255);
        assert_eq!(header.src, Ipv6Addr::LOCALHOST);
        assert_eq!(header.dst, Ipv6Addr::new(0, 0, 0, 0, 0, 0, 0, 2));
        assert_eq!(&header.to_bytes()[..], &bytes[..Ipv6Header::SIZE]);
    }

    #[test]
    fn test_truncated_header() {
        assert_eq!(Ipv6Header::from_bytes(&[0x60; 39]), Err(HeaderError::Truncated));
    }
}
