use educe::Educe;
use thiserror::Error;

use crate::framework::RoutingSystem;

/// Wire decoding failures. The offending packet is dropped and nothing is applied.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum HeaderError {
    #[error("truncated buffer: header needs {needed} bytes, {remaining} remaining")]
    Truncated { needed: usize, remaining: usize },
}

#[derive(Error)]
#[derive(Educe)]
#[educe(Debug(bound()))]
pub enum RoutingError<T: RoutingSystem + ?Sized> {
    #[error("malformed route advertisement: {0}")]
    Malformed(#[from] HeaderError),
    /// The packet arrived on a device that has no configured interface address
    #[error("no interface configured for device {device:?}")]
    UnknownDevice { device: T::Device },
}
