//! NOS API - Core interfaces and types for the NOS operating system
//!
//! This crate provides the core types shared between kernel subsystems.
//! It is intentionally small: subsystems such as the IPv6 flow cache depend
//! on it for their error type, locking primitives and network-layer types
//! without pulling in each other.
//!
//! # Architecture
//!
//! - **Error**: Common error type and `Result` alias
//! - **Sync**: Lock and atomic re-exports usable in `no_std`
//! - **Net**: IPv6 fixed header, link-layer reception flags and the packet
//!   container handed to forwarding code
//!
//! # Usage
//!
//! ```rust
//! use nos_api::net::{Ipv6Header, LinkFlags, Packet};
//!
//! let bytes = [0x60, 0, 0, 0, 0, 0, 17, 64, 0, 0, 0, 0, 0, 0, 0, 0,
//!              0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 0,
//!              0, 0, 0, 0, 0, 0, 0, 2];
//! let header = Ipv6Header::from_bytes(&bytes).unwrap();
//! let packet = Packet::new(header, LinkFlags::empty(), Vec::new());
//! assert_eq!(packet.len(), Ipv6Header::SIZE);
//! ```

#![no_std]

#[cfg(feature = "std")]
extern crate std;

extern crate alloc;

pub mod error;
pub mod net;
pub mod sync;

// Re-export commonly used types
pub use crate::error::{Error, Result};
