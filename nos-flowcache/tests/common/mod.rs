//! Common fixtures for the flow cache integration tests

#![allow(dead_code)]

use std::net::Ipv6Addr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use nos_api::net::{Ipv6Header, LinkFlags, Packet};
use nos_flowcache::{
    FlowCache, FlowCacheConfig, FlowKey, FlowLabel, FlowStats, RouteHandle, RouteInfo,
};

/// Routing-table side of a `SimRoute`
#[derive(Debug, Default)]
pub struct RouteEntry {
    withdrawn: AtomicBool,
    releases: AtomicUsize,
    uses: AtomicU64,
}

impl RouteEntry {
    pub fn withdraw(&self) {
        self.withdrawn.store(true, Ordering::SeqCst);
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    pub fn uses(&self) -> u64 {
        self.uses.load(Ordering::SeqCst)
    }
}

/// Route handle backed by a shared `RouteEntry`
#[derive(Debug)]
pub struct SimRoute {
    pub mtu: usize,
    pub gateway: Option<Ipv6Addr>,
    pub ifindex: u32,
    entry: Arc<RouteEntry>,
}

impl SimRoute {
    pub fn new(mtu: usize) -> (Self, Arc<RouteEntry>) {
        let entry = Arc::new(RouteEntry::default());
        let route = Self { mtu, gateway: None, ifindex: 2, entry: Arc::clone(&entry) };
        (route, entry)
    }

    pub fn via(mut self, gateway: Ipv6Addr) -> Self {
        self.gateway = Some(gateway);
        self
    }
}

impl RouteHandle for SimRoute {
    type Interface = u32;

    fn validate(&self) -> Option<RouteInfo<u32>> {
        if self.entry.withdrawn.load(Ordering::SeqCst) {
            return None;
        }
        Some(RouteInfo { mtu: self.mtu, gateway: self.gateway, interface: self.ifindex })
    }

    fn release(self) {
        self.entry.releases.fetch_add(1, Ordering::SeqCst);
    }

    fn note_uses(&self, uses: u64) {
        self.entry.uses.fetch_add(uses, Ordering::SeqCst);
    }
}

pub fn host(net: u16, n: u16) -> Ipv6Addr {
    Ipv6Addr::new(0x2001, 0xdb8, net, 0, 0, 0, 0, n)
}

/// Header of a TCP segment from host `n` to host `n` on the far network
pub fn header(n: u16, payload_len: u16) -> Ipv6Header {
    Ipv6Header::new(host(1, n), host(2, n), 0x12345, 6, payload_len, 64)
}

pub fn key(n: u16) -> FlowKey {
    FlowKey::new(host(1, n), host(2, n), FlowLabel::new(0x12345))
}

pub fn packet(n: u16, payload_len: u16) -> Packet {
    Packet::new(header(n, payload_len), LinkFlags::empty(), vec![0; payload_len as usize])
}

pub fn new_cache(config: FlowCacheConfig) -> (FlowCache<SimRoute>, Arc<FlowStats>) {
    let stats = Arc::new(FlowStats::new());
    let cache = FlowCache::new(config, stats.clone()).expect("valid configuration");
    (cache, stats)
}
