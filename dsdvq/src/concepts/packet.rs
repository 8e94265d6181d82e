use std::net::Ipv4Addr;

use educe::Educe;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::feedback::HeaderError;
use crate::framework::RoutingSystem;

/// A fixed or self-describing record that can be layered onto a [`Packet`]
pub trait Header: Sized {
    fn serialized_size(&self) -> usize;
    /// appends the wire form of this header to `out`
    fn write_to(&self, out: &mut Vec<u8>);
    /// reads the header from the front of `buf`
    fn read_from(buf: &[u8]) -> Result<Self, HeaderError>;
}

/// Route state of one destination as known by the advertiser.
///
/// | Offset | Size | Field |
/// |---|---|---|
/// | 0 | 4 | destination address |
/// | 4 | 4 | destination sequence number |
/// | 8 | 4 | hop count |
///
/// All fields are in network byte order.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RouteAdvertisement {
    destination: Ipv4Addr,
    seqno: u32,
    hop_count: u32,
}

impl RouteAdvertisement {
    pub const SERIALIZED_SIZE: usize = 12;

    pub fn new(destination: Ipv4Addr, seqno: u32, hop_count: u32) -> Self {
        Self {
            destination,
            seqno,
            hop_count,
        }
    }

    pub fn destination(&self) -> Ipv4Addr {
        self.destination
    }
    pub fn set_destination(&mut self, destination: Ipv4Addr) {
        self.destination = destination;
    }
    pub fn seqno(&self) -> u32 {
        self.seqno
    }
    pub fn set_seqno(&mut self, seqno: u32) {
        self.seqno = seqno;
    }
    pub fn hop_count(&self) -> u32 {
        self.hop_count
    }
    pub fn set_hop_count(&mut self, hop_count: u32) {
        self.hop_count = hop_count;
    }
}

impl Default for RouteAdvertisement {
    fn default() -> Self {
        Self::new(Ipv4Addr::UNSPECIFIED, 0, 0)
    }
}

impl Header for RouteAdvertisement {
    fn serialized_size(&self) -> usize {
        Self::SERIALIZED_SIZE
    }

    fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.destination.octets());
        out.extend_from_slice(&self.seqno.to_be_bytes());
        out.extend_from_slice(&self.hop_count.to_be_bytes());
    }

    fn read_from(buf: &[u8]) -> Result<Self, HeaderError> {
        if buf.len() < Self::SERIALIZED_SIZE {
            return Err(HeaderError::Truncated {
                needed: Self::SERIALIZED_SIZE,
                remaining: buf.len(),
            });
        }
        let word = |at: usize| u32::from_be_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]]);
        Ok(Self {
            destination: Ipv4Addr::from(word(0)),
            seqno: word(4),
            hop_count: word(8),
        })
    }
}

/// Raw packet bytes. Headers are pushed to and popped from the front, so the last header added
/// is the first one removed.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Packet {
    data: Vec<u8>,
}

impl Packet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    pub fn add_header<H: Header>(&mut self, header: &H) {
        let mut bytes = Vec::with_capacity(header.serialized_size() + self.data.len());
        header.write_to(&mut bytes);
        bytes.extend_from_slice(&self.data);
        self.data = bytes;
    }

    pub fn peek_header<H: Header>(&self) -> Result<H, HeaderError> {
        H::read_from(&self.data)
    }

    /// On failure the packet is left untouched
    pub fn remove_header<H: Header>(&mut self) -> Result<H, HeaderError> {
        let header = H::read_from(&self.data)?;
        self.data.drain(..header.serialized_size());
        Ok(header)
    }

    /// Builds a full update packet, records keep the order of `ads`
    pub fn from_advertisements<'a>(ads: impl IntoIterator<Item = &'a RouteAdvertisement>) -> Self {
        let mut data = Vec::new();
        for ad in ads {
            ad.write_to(&mut data);
        }
        Self { data }
    }

    /// Decodes every record of an update packet. A trailing partial record fails the whole packet.
    pub fn advertisements(&self) -> Result<Vec<RouteAdvertisement>, HeaderError> {
        let rem = self.data.len() % RouteAdvertisement::SERIALIZED_SIZE;
        if rem != 0 {
            return Err(HeaderError::Truncated {
                needed: RouteAdvertisement::SERIALIZED_SIZE,
                remaining: rem,
            });
        }
        self.data
            .chunks_exact(RouteAdvertisement::SERIALIZED_SIZE)
            .map(RouteAdvertisement::read_from)
            .collect()
    }
}

#[derive(Educe)]
#[educe(Clone(bound()), Debug(bound()))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(bound = ""))]
pub struct OutboundPacket<T: RoutingSystem + ?Sized> {
    /// send via this device
    pub device: T::Device,
    /// to this link-layer destination, the interface broadcast address for advertisements
    pub dest: Ipv4Addr,
    pub packet: Packet,
}
