/// Hop count advertised for an unreachable destination
pub const INF: u32 = u32::MAX;

/// Advances a sequence number without wrapping. Sequence numbers are compared as plain integers,
/// so a wrapped value would read as stale everywhere.
///
/// # Examples
///
/// ```
/// assert_eq!(dsdvq::util::increment_by(4, 2), 6);
/// assert_eq!(dsdvq::util::increment_by(u32::MAX - 1, 2), u32::MAX);
/// ```
pub fn increment_by(x: u32, y: u32) -> u32 {
    x.saturating_add(y)
}

pub fn sum_inf(hops_a: u32, hops_b: u32) -> u32 {
    if hops_a == INF || hops_b == INF {
        INF
    } else {
        hops_a.saturating_add(hops_b).min(INF - 1)
    }
}
