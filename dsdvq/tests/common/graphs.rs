use crate::common::virtual_network::VirtualSystem;

/// 0 - 1 - 2 - 3
pub fn vnet_line() -> VirtualSystem {
    VirtualSystem::create(4, &[(0, 1), (1, 2), (2, 3)])
}

/// Two paths from 0 to 4, the upper one a hop shorter
///
/// ```text
///   1 ------- 2
///  /           \
/// 0             4
///  \           /
///   3 - 5 - 6
/// ```
pub fn vnet_two_paths() -> VirtualSystem {
    VirtualSystem::create(7, &[(0, 1), (1, 2), (2, 4), (0, 3), (3, 5), (5, 6), (6, 4)])
}
