use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::net::Ipv4Addr;
use std::time::Duration;

use log::debug;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
#[cfg(feature = "serde")]
use serde_with::serde_as;

use crate::concepts::route::{Route, RouteState};
use crate::framework::{RoutingSystem, Timestamp};
use crate::util::{increment_by, INF};

/// Outcome of offering a candidate route against the stored one
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Admission {
    /// no stored route for the destination
    Insert,
    /// fresher sequence number, or same sequence number and fewer hops
    Replace,
    /// infinite hop count with a sequence number at least as fresh as the stored one
    Break,
    Reject,
}

/// Destination address -> best known route. Single writer, lookups take `&self`.
#[cfg_attr(feature = "serde", serde_as)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(bound = ""))]
pub struct RoutingTable<T: RoutingSystem + ?Sized> {
    #[cfg_attr(feature = "serde", serde_as(as = "Vec<(_, _)>"))]
    routes: HashMap<Ipv4Addr, Route<T>>,
    /// how long invalid routes are retained before `purge` drops them
    gc_delay: Duration,
}

impl<T: RoutingSystem + ?Sized> Default for RoutingTable<T> {
    fn default() -> Self {
        Self::new(T::config().garbage_collection_delay)
    }
}

impl<T: RoutingSystem + ?Sized> RoutingTable<T> {
    pub fn new(gc_delay: Duration) -> Self {
        Self {
            routes: HashMap::new(),
            gc_delay,
        }
    }

    /// Inserts a route for a destination the table does not know yet. Existing routes are left
    /// untouched, use [`RoutingTable::update_route`] for those.
    pub fn add_route(&mut self, route: Route<T>) -> bool {
        if self.routes.contains_key(&route.destination) {
            return false;
        }
        self.routes.insert(route.destination, route);
        true
    }

    /// A copy of the route to `dst` if it is valid and has not expired at `now`
    pub fn lookup_route(&self, dst: Ipv4Addr, now: Timestamp) -> Option<Route<T>> {
        self.routes
            .get(&dst)
            .filter(|route| route.is_valid() && !route.is_expired(now))
            .cloned()
    }

    /// The stored route to `dst` in any state
    pub fn lookup_any(&self, dst: Ipv4Addr) -> Option<&Route<T>> {
        self.routes.get(&dst)
    }

    /// Decides what `candidate` would do to the table, without changing it
    pub fn admission(&self, candidate: &Route<T>) -> Admission {
        let Some(stored) = self.routes.get(&candidate.destination) else {
            return Admission::Insert;
        };
        let (s, n) = (stored.seqno, candidate.seqno);
        if n < s {
            return Admission::Reject; // stale, seqno cannot decrease
        }
        if candidate.hop_count == INF {
            // a break we already hold is only news with a newer seqno
            return if stored.is_valid() || n > s {
                Admission::Break
            } else {
                Admission::Reject
            };
        }
        if n > s || candidate.hop_count < stored.hop_count {
            Admission::Replace
        } else {
            // same freshness, no shorter: the installed route wins
            Admission::Reject
        }
    }

    /// Offers a candidate route, returns whether the table changed.
    pub fn update_route(&mut self, mut candidate: Route<T>, now: Timestamp) -> bool {
        let admission = self.admission(&candidate);
        match admission {
            Admission::Reject => false,
            Admission::Break => {
                let Some(stored) = self.routes.get_mut(&candidate.destination) else {
                    return false;
                };
                let seqno = if candidate.seqno > stored.seqno {
                    candidate.seqno
                } else {
                    increment_by(stored.seqno, 1)
                };
                debug!(
                    "route to {} broken by {} (seqno {})",
                    stored.destination, candidate.next_hop, seqno
                );
                stored.invalidate(seqno, now);
                true
            }
            // an unreachable destination we never knew is not worth an entry
            Admission::Insert if candidate.hop_count == INF => false,
            Admission::Insert | Admission::Replace => {
                candidate.refreshed = now;
                candidate.state = RouteState::Valid;
                candidate.changed = match self.routes.get(&candidate.destination) {
                    Some(stored) => {
                        stored.changed
                            || !stored.is_valid()
                            || stored.hop_count != candidate.hop_count
                            || stored.next_hop != candidate.next_hop
                    }
                    None => true,
                };
                debug!(
                    "accepted route to {} via {} (seqno {}, {} hops)",
                    candidate.destination, candidate.next_hop, candidate.seqno, candidate.hop_count
                );
                let prev = self.routes.insert(candidate.destination, candidate);
                debug_assert_eq!(prev.is_some(), admission == Admission::Replace);
                true
            }
        }
    }

    pub fn delete_route(&mut self, dst: Ipv4Addr) -> Option<Route<T>> {
        self.routes.remove(&dst)
    }

    pub fn destinations_with_next_hop(&self, next_hop: Ipv4Addr) -> Vec<Ipv4Addr> {
        self.routes
            .values()
            .filter(|route| route.next_hop == next_hop)
            .map(|route| route.destination)
            .collect()
    }

    /// Marks every valid route through `next_hop` invalid, returns the affected destinations.
    /// The routes stay in the table until [`RoutingTable::purge`] collects them.
    pub fn invalidate_routes_with_next_hop(&mut self, next_hop: Ipv4Addr, now: Timestamp) -> Vec<Ipv4Addr> {
        let mut broken = Vec::new();
        for route in self.routes.values_mut() {
            if route.next_hop == next_hop && route.is_valid() {
                route.invalidate(increment_by(route.seqno, 1), now);
                broken.push(route.destination);
            }
        }
        if !broken.is_empty() {
            debug!("invalidated {} routes through {}", broken.len(), next_hop);
        }
        broken
    }

    /// Turns valid routes whose lifetime elapsed into breaks, so they are advertised with INF hops
    /// and collected after the garbage-collection delay. Returns the affected destinations.
    pub fn expire(&mut self, now: Timestamp) -> Vec<Ipv4Addr> {
        let mut expired = Vec::new();
        for route in self.routes.values_mut() {
            if route.is_valid() && route.is_expired(now) {
                route.invalidate(increment_by(route.seqno, 1), now);
                expired.push(route.destination);
            }
        }
        if !expired.is_empty() {
            debug!("{} routes expired", expired.len());
        }
        expired
    }

    /// Drops every route installed on `device`, returns how many were removed
    pub fn delete_all_routes_from_device(&mut self, device: &T::Device) -> usize {
        let before = self.routes.len();
        self.routes.retain(|_, route| route.device.as_ref() != Some(device));
        before - self.routes.len()
    }

    /// Removes routes invalid for longer than the garbage-collection delay and valid routes whose
    /// lifetime elapsed without renewal. Returns the removed destinations.
    pub fn purge(&mut self, now: Timestamp) -> Vec<Ipv4Addr> {
        let gc_delay = self.gc_delay;
        let mut removed = Vec::new();
        self.routes.retain(|dst, route| {
            let keep = match route.state {
                RouteState::Valid => !route.is_expired(now),
                RouteState::Invalid { since } => now.saturating_since(since) <= gc_delay,
            };
            if !keep {
                removed.push(*dst);
            }
            keep
        });
        if !removed.is_empty() {
            debug!("purged {} routes", removed.len());
        }
        removed
    }

    pub fn routing_table_size(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn routes(&self) -> impl Iterator<Item = &Route<T>> {
        self.routes.values()
    }

    /// Routes flagged for the next triggered update
    pub fn changed_routes(&self) -> impl Iterator<Item = &Route<T>> {
        self.routes.values().filter(|route| route.changed)
    }

    pub fn clear_changed(&mut self) {
        for route in self.routes.values_mut() {
            route.changed = false;
        }
    }
}

impl<T: RoutingSystem + ?Sized> Display for RoutingTable<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut routes: Vec<_> = self.routes.values().collect();
        routes.sort_by_key(|route| route.destination);
        writeln!(f, "Destination\tGateway\tInterface\tHopCount\tSeqNum\tState")?;
        routes
            .into_iter()
            .try_for_each(|route| writeln!(f, "{}", route))
    }
}
