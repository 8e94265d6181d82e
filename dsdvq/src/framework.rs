use std::fmt::{Debug, Display, Formatter};
use std::hash::Hash;
use std::ops::Add;
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub trait RoutingSystem {
    /// Opaque handle of a local network device. The routing table only stores it, device lifetime
    /// is owned by whoever assembled the node.
    type Device: RootKey + RootData + Debug;
    fn config() -> ProtocolParams {
        Default::default()
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "serde")] {
        pub trait RootData: Clone + Serialize + serde::de::DeserializeOwned + Sized {}
        impl<T: Clone + Serialize + serde::de::DeserializeOwned + Sized> RootData for T {}
    } else {
        pub trait RootData: Clone + Sized {}
        impl<T: Clone + Sized> RootData for T {}
    }
}
pub trait RootKey: Eq + PartialEq + Hash {}
impl<T: Eq + PartialEq + Hash> RootKey for T {}

/// Point in time as seen by the scheduler driving the protocol, measured from its epoch.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Timestamp(pub Duration);

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp(Duration::ZERO);

    pub fn from_secs(secs: u64) -> Self {
        Timestamp(Duration::from_secs(secs))
    }

    /// `None` when the result is not representable, which callers treat as "never"
    pub fn checked_add(self, delta: Duration) -> Option<Timestamp> {
        self.0.checked_add(delta).map(Timestamp)
    }

    pub fn saturating_since(self, earlier: Timestamp) -> Duration {
        self.0.saturating_sub(earlier.0)
    }
}

impl Add<Duration> for Timestamp {
    type Output = Timestamp;

    fn add(self, rhs: Duration) -> Timestamp {
        Timestamp(self.0.saturating_add(rhs))
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.3}s", self.0.as_secs_f64())
    }
}

/// Timers the protocol asks its scheduler to fire
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Timer {
    /// full-table advertisement on every interface
    PeriodicUpdate,
    /// garbage collection of invalid and expired routes
    Purge,
}

/// Event scheduling capability injected by the environment (a simulator or a runtime).
/// The routing table never touches it, only the protocol driver does.
pub trait Scheduler {
    fn now(&self) -> Timestamp;
    fn schedule_after(&mut self, delay: Duration, timer: Timer);
}

/// Protocol Parameters
#[derive(Clone, Debug)]
pub struct ProtocolParams {
    /// interval between full-table advertisements
    pub periodic_update_interval: Duration,
    /// number of missed periodic updates after which a route is stale
    pub holdtimes: u32,
    /// how long an invalidated route is retained to propagate the break
    pub garbage_collection_delay: Duration,
    pub purge_interval: Duration,
}

impl ProtocolParams {
    /// Lifetime given to routes learned from advertisements
    pub fn route_lifetime(&self) -> Duration {
        self.periodic_update_interval.saturating_mul(self.holdtimes)
    }
}

impl Default for ProtocolParams {
    fn default() -> Self {
        Self {
            periodic_update_interval: Duration::from_secs(15),
            holdtimes: 3,
            garbage_collection_delay: Duration::from_secs(30),
            purge_interval: Duration::from_secs(15),
        }
    }
}
