//! Shared fixtures for unit tests

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::net::Ipv6Addr;

use nos_api::net::{Ipv6Header, LinkFlags, Packet};
use nos_api::sync::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use crate::key::{FlowKey, FlowLabel};
use crate::route::{RouteHandle, RouteInfo, TransmitError};

/// Observable state behind a `TestRoute`
#[derive(Debug, Default)]
pub struct RouteState {
    pub stale: AtomicBool,
    pub releases: AtomicUsize,
    pub uses: AtomicU64,
}

impl RouteState {
    pub fn withdraw(&self) {
        self.stale.store(true, Ordering::SeqCst);
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub struct TestRoute {
    pub mtu: usize,
    pub gateway: Option<Ipv6Addr>,
    pub ifindex: u32,
    pub state: Arc<RouteState>,
}

impl TestRoute {
    pub fn new(mtu: usize) -> (Self, Arc<RouteState>) {
        let state = Arc::new(RouteState::default());
        let route = Self { mtu, gateway: None, ifindex: 1, state: Arc::clone(&state) };
        (route, state)
    }

    pub fn via(mut self, gateway: Ipv6Addr) -> Self {
        self.gateway = Some(gateway);
        self
    }
}

impl RouteHandle for TestRoute {
    type Interface = u32;

    fn validate(&self) -> Option<RouteInfo<u32>> {
        if self.state.stale.load(Ordering::SeqCst) {
            return None;
        }
        Some(RouteInfo { mtu: self.mtu, gateway: self.gateway, interface: self.ifindex })
    }

    fn release(self) {
        self.state.releases.fetch_add(1, Ordering::SeqCst);
    }

    fn note_uses(&self, uses: u64) {
        self.state.uses.fetch_add(uses, Ordering::SeqCst);
    }
}

pub fn src(n: u16) -> Ipv6Addr {
    Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, n)
}

pub fn dst(n: u16) -> Ipv6Addr {
    Ipv6Addr::new(0x2001, 0xdb8, 0xffff, 0, 0, 0, 0, n)
}

/// Key of flow `n`
pub fn key(n: u16) -> FlowKey {
    FlowKey::new(src(n), dst(n), FlowLabel::new(n as u32))
}

/// Header of a UDP datagram on flow `n`
pub fn header(n: u16, payload_len: u16) -> Ipv6Header {
    Ipv6Header::new(src(n), dst(n), n as u32, 17, payload_len, 64)
}

pub fn packet(n: u16, payload_len: u16) -> Packet {
    Packet::new(header(n, payload_len), LinkFlags::empty(), Vec::new())
}

/// Transmit primitive that accepts everything and counts calls
pub fn accept_all(
    sent: &AtomicUsize,
) -> impl FnMut(&u32, &Packet, Ipv6Addr, &RouteInfo<u32>) -> Result<(), TransmitError> + '_ {
    move |_, _, _, _| {
        sent.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
