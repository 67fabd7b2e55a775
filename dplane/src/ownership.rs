// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Which addresses are configured where.
//!
//! `owned_ips` is the per-interface symbolic view. [OwnedAddressIndex] is
//! the snapshot-wide accelerated form: every owned address and every
//! configured subnet collapsed into sorted, merged `u32` ranges answering
//! point queries by binary search. It is an internal detail of ownership
//! resolution, not a second analysis path.

use crate::types::{InterfaceConfig, NodeConfig, NodeName};
use ipspace::IpSpace;
use std::collections::{BTreeMap, BTreeSet};
use std::net::Ipv4Addr;

/// The set of addresses configured directly on an interface. Empty when
/// the interface has no addresses.
pub fn owned_ips(config: &InterfaceConfig) -> IpSpace {
    IpSpace::union(config.addresses.iter().map(|a| IpSpace::from(a.addr)))
}

/// Sorted, non-overlapping inclusive ranges.
type Ranges = Vec<(u32, u32)>;

#[derive(Debug, Clone)]
pub struct OwnedAddressIndex {
    owned: Ranges,
    subnets: Ranges,
    owned_space: IpSpace,
}

impl OwnedAddressIndex {
    pub fn new(configurations: &BTreeMap<NodeName, NodeConfig>) -> Self {
        let mut owned_addrs: BTreeSet<Ipv4Addr> = BTreeSet::new();
        let mut subnet_ranges: Ranges = Vec::new();
        for config in configurations.values() {
            for iface in config.interfaces.values() {
                for address in &iface.addresses {
                    owned_addrs.insert(address.addr);
                    let subnet = address.subnet();
                    subnet_ranges.push((
                        subnet.first_address().to_bits(),
                        subnet.last_address().to_bits(),
                    ));
                }
            }
        }
        let owned_space =
            IpSpace::union(owned_addrs.iter().map(|a| IpSpace::from(*a)));
        let owned = merge_ranges(
            owned_addrs
                .into_iter()
                .map(|a| (a.to_bits(), a.to_bits()))
                .collect(),
        );
        let subnets = merge_ranges(subnet_ranges);
        Self {
            owned,
            subnets,
            owned_space,
        }
    }

    /// Is `ip` configured on any interface of any node?
    pub fn is_owned(&self, ip: Ipv4Addr) -> bool {
        ranges_contain(&self.owned, ip.to_bits())
    }

    /// Does `ip` fall inside any configured interface subnet anywhere in
    /// the snapshot?
    pub fn is_address_in_snapshot(&self, ip: Ipv4Addr) -> bool {
        ranges_contain(&self.subnets, ip.to_bits())
    }

    /// The symbolic union of every owned address, for set-algebra use.
    pub fn owned_space(&self) -> &IpSpace {
        &self.owned_space
    }
}

fn merge_ranges(mut ranges: Ranges) -> Ranges {
    ranges.sort_unstable();
    let mut merged: Ranges = Vec::with_capacity(ranges.len());
    for (start, end) in ranges {
        match merged.last_mut() {
            // Adjacent or overlapping: extend the previous range.
            Some((_, prev_end))
                if *prev_end >= start.saturating_sub(1) =>
            {
                *prev_end = (*prev_end).max(end);
            }
            _ => merged.push((start, end)),
        }
    }
    merged
}

fn ranges_contain(ranges: &Ranges, value: u32) -> bool {
    let i = ranges.partition_point(|&(start, _)| start <= value);
    i > 0 && ranges[i - 1].1 >= value
}

#[cfg(test)]
mod test {
    use super::{merge_ranges, owned_ips, OwnedAddressIndex};
    use crate::types::{InterfaceAddress, InterfaceConfig, NodeConfig};
    use dp_common::ip;
    use ipspace::IpSpace;
    use std::collections::BTreeMap;

    fn iface(addrs: &[(&str, u8)]) -> InterfaceConfig {
        InterfaceConfig {
            addresses: addrs
                .iter()
                .map(|(a, len)| {
                    InterfaceAddress::new(a.parse().expect("ip address"), *len)
                })
                .collect(),
            vrf: "default".to_string(),
            proxy_arp: false,
        }
    }

    fn node(ifaces: Vec<(&str, InterfaceConfig)>) -> NodeConfig {
        NodeConfig {
            interfaces: ifaces
                .into_iter()
                .map(|(name, c)| (name.to_string(), c))
                .collect(),
        }
    }

    #[test]
    fn test_owned_ips() {
        let two = iface(&[("192.0.2.1", 24), ("10.0.0.1", 8)]);
        let space = owned_ips(&two);
        assert!(space.contains(ip!("192.0.2.1")));
        assert!(space.contains(ip!("10.0.0.1")));
        // Owned means the address itself, not its subnet.
        assert!(!space.contains(ip!("192.0.2.2")));

        let bare = iface(&[]);
        assert_eq!(owned_ips(&bare), IpSpace::Empty);
    }

    #[test]
    fn test_merge_ranges() {
        assert_eq!(
            merge_ranges(vec![(10, 20), (15, 30), (31, 40), (50, 60)]),
            vec![(10, 40), (50, 60)]
        );
        assert_eq!(merge_ranges(vec![]), vec![]);
    }

    #[test]
    fn test_index_point_queries() {
        let mut configurations = BTreeMap::new();
        configurations.insert(
            "r1".to_string(),
            node(vec![("eth0", iface(&[("192.0.2.1", 24)]))]),
        );
        configurations.insert(
            "r2".to_string(),
            node(vec![("eth0", iface(&[("192.0.2.2", 24)]))]),
        );
        let index = OwnedAddressIndex::new(&configurations);

        assert!(index.is_owned(ip!("192.0.2.1")));
        assert!(index.is_owned(ip!("192.0.2.2")));
        assert!(!index.is_owned(ip!("192.0.2.3")));

        assert!(index.is_address_in_snapshot(ip!("192.0.2.200")));
        assert!(!index.is_address_in_snapshot(ip!("198.51.100.1")));

        assert!(index.owned_space().contains(ip!("192.0.2.1")));
        assert!(!index.owned_space().contains(ip!("192.0.2.9")));
    }
}
