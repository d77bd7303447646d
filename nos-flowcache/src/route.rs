//! Collaborators the flow cache forwards through
//!
//! The cache never owns routes. It holds a `RouteHandle` and asks it to
//! revalidate before every use, so a route that was withdrawn or whose
//! interface went down is observed as stale instead of being dereferenced.

use core::fmt;
use core::net::Ipv6Addr;

use nos_api::net::Packet;

/// What a valid route resolves to at the moment of use
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteInfo<I> {
    /// Link MTU of the outgoing interface
    pub mtu: usize,
    /// Next-hop router, `None` for on-link destinations
    pub gateway: Option<Ipv6Addr>,
    /// Outgoing interface, handed back to the transmit primitive
    pub interface: I,
}

impl<I> RouteInfo<I> {
    /// Address the datagram is handed to on the link
    pub fn next_hop(&self, dst: Ipv6Addr) -> Ipv6Addr {
        self.gateway.unwrap_or(dst)
    }
}

/// Revalidating reference to a route owned by the routing table
pub trait RouteHandle: Send {
    /// Outgoing interface type carried in `RouteInfo`
    type Interface;

    /// Resolve the route if it is still usable, `None` if it went stale
    fn validate(&self) -> Option<RouteInfo<Self::Interface>>;

    /// Drop this reference to the route
    fn release(self)
    where
        Self: Sized;

    /// Account packets forwarded on behalf of this route
    fn note_uses(&self, _uses: u64) {}
}

/// Transmit failures reported by the output primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransmitError {
    /// Interface is down
    InterfaceDown,
    /// Transmit queue is full
    QueueFull,
    /// No buffer space to build the frame
    NoBuffer,
    /// Link-layer address of the next hop is unresolved
    Unresolved,
}

impl fmt::Display for TransmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransmitError::InterfaceDown => write!(f, "interface is down"),
            TransmitError::QueueFull => write!(f, "transmit queue full"),
            TransmitError::NoBuffer => write!(f, "no buffer space"),
            TransmitError::Unresolved => write!(f, "next hop unresolved"),
        }
    }
}

/// Interface output primitive
///
/// Called with the flow cache lock held: implementations must not block
/// and must not call back into the cache.
pub trait Transmit<I> {
    /// Hand `packet` to `interface` for delivery to `next_hop`
    fn send(
        &mut self,
        interface: &I,
        packet: &Packet,
        next_hop: Ipv6Addr,
        route: &RouteInfo<I>,
    ) -> Result<(), TransmitError>;
}

impl<I, F> Transmit<I> for F
where
    F: FnMut(&I, &Packet, Ipv6Addr, &RouteInfo<I>) -> Result<(), TransmitError>,
{
    fn send(
        &mut self,
        interface: &I,
        packet: &Packet,
        next_hop: Ipv6Addr,
        route: &RouteInfo<I>,
    ) -> Result<(), TransmitError> {
        self(interface, packet, next_hop, route)
    }
}
