use std::fmt::{Display, Formatter};
use std::net::Ipv4Addr;
use std::time::Duration;

use educe::Educe;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::concepts::interface::InterfaceAddress;
use crate::concepts::packet::RouteAdvertisement;
use crate::framework::{RoutingSystem, Timestamp};
use crate::util::INF;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RouteState {
    Valid,
    /// broken, retained until the garbage-collection delay has passed since `since`
    Invalid { since: Timestamp },
}

/// Routing table entry, the best known route to one destination
#[derive(Educe)]
#[educe(Clone(bound()), Debug(bound()), PartialEq(bound()))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(bound = ""))]
pub struct Route<T: RoutingSystem + ?Sized> {
    /// device used to reach the next hop, not owned by the table
    pub device: Option<T::Device>,
    pub destination: Ipv4Addr,
    /// the freshest sequence number accepted for the destination
    pub seqno: u32,
    /// local interface the route is installed against
    pub interface: InterfaceAddress,
    /// hops to the destination, INF once broken
    pub hop_count: u32,
    /// the next-hop address of this route, the destination itself for a one-hop route
    pub next_hop: Ipv4Addr,
    /// how long the route stays usable after `refreshed` without being renewed
    pub lifetime: Duration,
    pub refreshed: Timestamp,
    pub state: RouteState,
    /// set when the route should go out in the next triggered update
    pub changed: bool,
}

impl<T: RoutingSystem + ?Sized> Route<T> {
    /// Lifetime of routes that never expire (local and broadcast routes)
    pub const PERMANENT: Duration = Duration::MAX;

    #[allow(clippy::too_many_arguments)]
    pub fn new(
        device: Option<T::Device>,
        destination: Ipv4Addr,
        seqno: u32,
        interface: InterfaceAddress,
        hop_count: u32,
        next_hop: Ipv4Addr,
        lifetime: Duration,
        now: Timestamp,
    ) -> Self {
        Self {
            device,
            destination,
            seqno,
            interface,
            hop_count,
            next_hop,
            lifetime,
            refreshed: now,
            state: RouteState::Valid,
            changed: false,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.state == RouteState::Valid
    }

    /// `None` for routes that never expire
    pub fn expires_at(&self) -> Option<Timestamp> {
        if self.lifetime == Self::PERMANENT {
            return None;
        }
        self.refreshed.checked_add(self.lifetime)
    }

    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expires_at().is_some_and(|at| now >= at)
    }

    /// Whether this is the hop-0 route of an interface's own broadcast address
    pub fn is_broadcast(&self) -> bool {
        self.destination == self.interface.broadcast
    }

    /// Marks the route broken. The sequence number moves past the one that is being invalidated,
    /// so older advertisements of the working route can no longer win.
    pub fn invalidate(&mut self, seqno: u32, now: Timestamp) {
        self.seqno = seqno;
        self.hop_count = INF;
        self.state = RouteState::Invalid { since: now };
        self.changed = true;
    }

    /// The record this route is advertised with, INF hops while broken
    pub fn advertisement(&self) -> RouteAdvertisement {
        let hops = if self.is_valid() { self.hop_count } else { INF };
        RouteAdvertisement::new(self.destination, self.seqno, hops)
    }
}

impl<T: RoutingSystem + ?Sized> Display for Route<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let hops = if self.hop_count == INF {
            "inf".to_string()
        } else {
            self.hop_count.to_string()
        };
        let state = match self.state {
            RouteState::Valid => "valid".to_string(),
            RouteState::Invalid { since } => format!("invalid since {since}"),
        };
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}",
            self.destination, self.next_hop, self.interface, hops, self.seqno, state
        )
    }
}
