use std::collections::BTreeSet;
use std::net::Ipv4Addr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use dsdvq::concepts::interface::InterfaceAddress;
use dsdvq::concepts::packet::Packet;
use dsdvq::framework::{RoutingSystem, Timestamp};
use dsdvq::router::Router;

/// Every node has one wireless device, a broadcast reaches every node it shares a link with
pub const DEVICE: u32 = 0;

pub fn addr(node: usize) -> Ipv4Addr {
    Ipv4Addr::new(10, 0, 0, node as u8 + 1)
}

#[derive(Serialize, Deserialize)]
pub struct VirtualSystem {
    pub routers: Vec<Router<VirtualSystem>>,
    pub links: BTreeSet<(usize, usize)>,
    /// (from, to, packet) waiting for the next tick
    pub packets: Vec<(usize, usize, Packet)>,
    pub now: Timestamp,
}

impl VirtualSystem {
    pub fn create(nodes: usize, links: &[(usize, usize)]) -> VirtualSystem {
        let routers = (0..nodes)
            .map(|node| {
                let mut router = Router::<VirtualSystem>::new(addr(node));
                router.add_interface(DEVICE, InterfaceAddress::with_prefix_len(addr(node), 24), Timestamp::ZERO);
                router
            })
            .collect();
        VirtualSystem {
            routers,
            links: links.iter().map(|&(a, b)| (a.min(b), a.max(b))).collect(),
            packets: Vec::new(),
            now: Timestamp::ZERO,
        }
    }

    pub fn is_linked(&self, a: usize, b: usize) -> bool {
        self.links.contains(&(a.min(b), a.max(b)))
    }

    pub fn add_link(&mut self, a: usize, b: usize) {
        self.links.insert((a.min(b), a.max(b)));
    }

    /// removes the link without either end noticing
    pub fn cut_link(&mut self, a: usize, b: usize) {
        self.links.remove(&(a.min(b), a.max(b)));
    }

    /// removes the link and reports the failure to both ends
    pub fn break_link(&mut self, a: usize, b: usize) {
        self.cut_link(a, b);
        let now = self.now;
        self.routers[a].link_broken(addr(b), now);
        self.routers[b].link_broken(addr(a), now);
        self.flush_packets();
    }

    pub fn flush_packets(&mut self) {
        for from in 0..self.routers.len() {
            let outbound: Vec<_> = self.routers[from].outbound_packets.drain(..).collect();
            for out in outbound {
                for to in 0..self.routers.len() {
                    if to != from && self.is_linked(from, to) {
                        self.packets.push((from, to, out.packet.clone()));
                    }
                }
            }
        }
    }

    pub fn advance(&mut self, by: Duration) {
        self.now = self.now + by;
    }

    /// delivers pending packets, then lets every node send its triggered updates
    pub fn tick(&mut self) {
        self.advance(Duration::from_secs(1));
        let now = self.now;
        for (from, to, packet) in std::mem::take(&mut self.packets) {
            self.routers[to]
                .handle_packet(&packet, &DEVICE, addr(from), now)
                .unwrap_or_else(|err| panic!("node {to} rejected update from {from}: {err}"));
        }
        for router in &mut self.routers {
            router.triggered_update(now);
        }
        self.flush_packets();
    }

    pub fn tick_n(&mut self, times: usize) {
        for _ in 0..times {
            self.tick();
        }
    }

    /// one round of full-table advertisements, delivered
    pub fn advertise(&mut self) {
        let now = self.now;
        for router in &mut self.routers {
            router.periodic_update(now);
        }
        self.flush_packets();
        self.tick();
    }

    pub fn converge(&mut self, rounds: usize) {
        for _ in 0..rounds {
            self.advertise();
        }
    }

    pub fn get_next_hop(&self, cur: usize, dst: usize) -> Option<Ipv4Addr> {
        self.routers[cur]
            .route_output(addr(dst), self.now)
            .map(|route| route.next_hop)
    }

    pub fn get_hops_to(&self, cur: usize, dst: usize) -> Option<u32> {
        self.routers[cur]
            .route_output(addr(dst), self.now)
            .map(|route| route.hop_count)
    }

    pub fn get_seqno_to(&self, cur: usize, dst: usize) -> u32 {
        self.routers[cur]
            .table
            .lookup_any(addr(dst))
            .unwrap_or_else(|| panic!("node {cur} has no entry for {dst}"))
            .seqno
    }

    pub fn freeze(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn restore(state: &str) -> anyhow::Result<VirtualSystem> {
        Ok(serde_json::from_str(state)?)
    }
}

impl RoutingSystem for VirtualSystem {
    type Device = u32;
}
