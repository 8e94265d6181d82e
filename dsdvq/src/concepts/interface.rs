use std::fmt::{Display, Formatter};
use std::net::Ipv4Addr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Local address a route is installed against
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct InterfaceAddress {
    pub local: Ipv4Addr,
    pub mask: Ipv4Addr,
    pub broadcast: Ipv4Addr,
}

impl InterfaceAddress {
    pub fn new(local: Ipv4Addr, mask: Ipv4Addr) -> Self {
        let broadcast = Ipv4Addr::from(u32::from(local) | !u32::from(mask));
        Self {
            local,
            mask,
            broadcast,
        }
    }

    pub fn with_prefix_len(local: Ipv4Addr, prefix_len: u8) -> Self {
        let mask = match prefix_len {
            0 => 0,
            n => u32::MAX << (32 - u32::from(n.min(32))),
        };
        Self::new(local, Ipv4Addr::from(mask))
    }

    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        let mask = u32::from(self.mask);
        u32::from(addr) & mask == u32::from(self.local) & mask
    }
}

impl Default for InterfaceAddress {
    fn default() -> Self {
        Self::new(Ipv4Addr::UNSPECIFIED, Ipv4Addr::UNSPECIFIED)
    }
}

impl Display for InterfaceAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.local, u32::from(self.mask).count_ones())
    }
}
