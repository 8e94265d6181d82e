//! Routing table and wire format core of a sequence-numbered distance-vector protocol for mesh
//! and mobile ad-hoc networks.
//!
//! The crate performs no I/O and reads no clock. The caller feeds received update packets and the
//! current [`framework::Timestamp`] in, and transmits whatever the [`router::Router`] queues.

pub mod concepts;
pub mod feedback;
pub mod framework;
pub mod router;
pub mod table;
pub mod util;
