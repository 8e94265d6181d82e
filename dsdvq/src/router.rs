use std::collections::HashMap;
use std::net::Ipv4Addr;

use log::{debug, info, warn};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
#[cfg(feature = "serde")]
use serde_with::serde_as;

use crate::concepts::interface::InterfaceAddress;
use crate::concepts::packet::{OutboundPacket, Packet, RouteAdvertisement};
use crate::concepts::route::Route;
use crate::feedback::RoutingError;
use crate::framework::{RoutingSystem, Scheduler, Timer, Timestamp};
use crate::table::RoutingTable;
use crate::util::{increment_by, sum_inf};

/// I/O free protocol driver of one node. Received packets go in through
/// [`Router::handle_packet`], advertisements to send pile up in `outbound_packets`.
#[cfg_attr(feature = "serde", serde_as)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(bound = ""))]
pub struct Router<T: RoutingSystem + ?Sized> {
    /// main address of the node, used as the advertised self route
    pub address: Ipv4Addr,
    #[cfg_attr(feature = "serde", serde_as(as = "Vec<(_, _)>"))]
    pub interfaces: HashMap<T::Device, InterfaceAddress>,
    pub table: RoutingTable<T>,
    /// our own sequence number, even while we are reachable
    pub seqno: u32,
    pub outbound_packets: Vec<OutboundPacket<T>>,
}

impl<T: RoutingSystem + ?Sized> Router<T> {
    pub fn new(address: Ipv4Addr) -> Self {
        Self {
            address,
            interfaces: HashMap::new(),
            table: RoutingTable::default(),
            seqno: 0,
            outbound_packets: Vec::new(),
        }
    }

    // region Interface
    /// brings up an interface and installs the permanent route to its broadcast address
    pub fn add_interface(&mut self, device: T::Device, itf: InterfaceAddress, now: Timestamp) {
        info!("interface {} up on {:?}", itf, device);
        self.table.add_route(Route::new(
            Some(device.clone()),
            itf.broadcast,
            0,
            itf,
            0,
            itf.broadcast,
            Route::<T>::PERMANENT,
            now,
        ));
        self.interfaces.insert(device, itf);
    }

    /// takes an interface down, forgetting every route installed on it
    pub fn remove_interface(&mut self, device: &T::Device) {
        if let Some(itf) = self.interfaces.remove(device) {
            let removed = self.table.delete_all_routes_from_device(device);
            info!("interface {} down on {:?}, {} routes removed", itf, device, removed);
        }
    }

    fn is_own_address(&self, addr: Ipv4Addr) -> bool {
        addr == self.address
            || self
                .interfaces
                .values()
                .any(|itf| itf.local == addr || itf.broadcast == addr)
    }

    /// writes a packet to the outbound packet queue for every interface's broadcast address
    fn write_broadcast_packet(&mut self, packet: &Packet) {
        for (device, itf) in &self.interfaces {
            self.outbound_packets.push(OutboundPacket {
                device: device.clone(),
                dest: itf.broadcast,
                packet: packet.clone(),
            });
        }
    }
    // endregion

    /// Handles one update packet received on `device` from the neighbour `sender`.
    /// Every record is decoded before any of them is applied, returns the number of accepted routes.
    pub fn handle_packet(
        &mut self,
        packet: &Packet,
        device: &T::Device,
        sender: Ipv4Addr,
        now: Timestamp,
    ) -> Result<usize, RoutingError<T>> {
        let ads = match packet.advertisements() {
            Ok(ads) => ads,
            Err(err) => {
                warn!("dropping update from {}: {}", sender, err);
                return Err(err.into());
            }
        };
        let Some(itf) = self.interfaces.get(device).copied() else {
            return Err(RoutingError::UnknownDevice {
                device: device.clone(),
            });
        };
        let lifetime = T::config().route_lifetime();

        let mut accepted = 0;
        for ad in ads {
            if self.is_own_address(ad.destination()) {
                continue; // we can safely ignore a route to ourself
            }
            let candidate = Route::new(
                Some(device.clone()),
                ad.destination(),
                ad.seqno(),
                itf,
                sum_inf(ad.hop_count(), 1),
                sender,
                lifetime,
                now,
            );
            if self.table.update_route(candidate, now) {
                accepted += 1;
            }
        }
        Ok(accepted)
    }

    fn self_advertisement(&self) -> RouteAdvertisement {
        RouteAdvertisement::new(self.address, self.seqno, 0)
    }

    /// Full dump: our own route with a fresh seqno, then every known route (broken ones with INF hops)
    pub fn periodic_update(&mut self, now: Timestamp) {
        self.table.expire(now);
        self.seqno = increment_by(self.seqno, 2);
        let mut ads = vec![self.self_advertisement()];
        ads.extend(
            self.table
                .routes()
                .filter(|route| !route.is_broadcast())
                .map(|route| route.advertisement()),
        );
        debug!("{} advertising {} routes (seqno {})", self.address, ads.len(), self.seqno);
        self.write_broadcast_packet(&Packet::from_advertisements(&ads));
        self.table.clear_changed();
    }

    /// Incremental update carrying only routes that changed since the last advertisement.
    /// Routes that ran out of lifetime by `now` go out as breaks.
    pub fn triggered_update(&mut self, now: Timestamp) {
        self.table.expire(now);
        let ads: Vec<_> = self
            .table
            .changed_routes()
            .filter(|route| !route.is_broadcast())
            .map(|route| route.advertisement())
            .collect();
        if ads.is_empty() {
            return;
        }
        debug!("{} triggered update for {} routes", self.address, ads.len());
        self.write_broadcast_packet(&Packet::from_advertisements(&ads));
        self.table.clear_changed();
    }

    /// Called when the link layer reports `next_hop` unreachable, breaks propagate immediately
    pub fn link_broken(&mut self, next_hop: Ipv4Addr, now: Timestamp) -> Vec<Ipv4Addr> {
        let broken = self.table.invalidate_routes_with_next_hop(next_hop, now);
        if !broken.is_empty() {
            warn!("link to {} broken, {} routes invalidated", next_hop, broken.len());
            self.triggered_update(now);
        }
        broken
    }

    /// Expired routes are advertised as breaks first, routes broken for longer than the
    /// garbage-collection delay are dropped. Returns the dropped destinations.
    pub fn purge(&mut self, now: Timestamp) -> Vec<Ipv4Addr> {
        self.triggered_update(now);
        self.table.purge(now)
    }

    /// Forwarding path: the route a packet for `dst` should take
    pub fn route_output(&self, dst: Ipv4Addr, now: Timestamp) -> Option<Route<T>> {
        self.table.lookup_route(dst, now)
    }

    // region Timers
    pub fn start(&mut self, scheduler: &mut impl Scheduler) {
        let params = T::config();
        scheduler.schedule_after(params.periodic_update_interval, Timer::PeriodicUpdate);
        scheduler.schedule_after(params.purge_interval, Timer::Purge);
    }

    /// runs an expired timer and re-arms it
    pub fn on_timer(&mut self, timer: Timer, scheduler: &mut impl Scheduler) {
        let params = T::config();
        match timer {
            Timer::PeriodicUpdate => {
                self.periodic_update(scheduler.now());
                scheduler.schedule_after(params.periodic_update_interval, Timer::PeriodicUpdate);
            }
            Timer::Purge => {
                let removed = self.purge(scheduler.now());
                if !removed.is_empty() {
                    debug!("{} forgot {:?}", self.address, removed);
                }
                scheduler.schedule_after(params.purge_interval, Timer::Purge);
            }
        }
    }
    // endregion
}
