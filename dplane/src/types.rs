// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use ipspace::Prefix4;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};
use std::net::Ipv4Addr;

pub type NodeName = String;
pub type VrfName = String;
pub type InterfaceName = String;

/// One end of an adjacency: a (node, interface) pair.
#[derive(
    Debug,
    Clone,
    Serialize,
    Deserialize,
    Eq,
    Hash,
    PartialEq,
    PartialOrd,
    Ord,
    JsonSchema,
)]
pub struct Endpoint {
    pub node: NodeName,
    pub interface: InterfaceName,
}

impl Endpoint {
    pub fn new(node: impl Into<NodeName>, interface: impl Into<InterfaceName>) -> Self {
        Self {
            node: node.into(),
            interface: interface.into(),
        }
    }
}

impl Display for Endpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.node, self.interface)
    }
}

/// A directed adjacency between two endpoints.
#[derive(
    Debug,
    Clone,
    Serialize,
    Deserialize,
    Eq,
    Hash,
    PartialEq,
    PartialOrd,
    Ord,
    JsonSchema,
)]
pub struct Edge {
    pub tail: Endpoint,
    pub head: Endpoint,
}

impl Edge {
    pub fn new(tail: Endpoint, head: Endpoint) -> Self {
        Self { tail, head }
    }

    pub fn reverse(&self) -> Self {
        Self {
            tail: self.head.clone(),
            head: self.tail.clone(),
        }
    }
}

impl Display for Edge {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.tail, self.head)
    }
}

/// An address configured on an interface, with the prefix length of the
/// attached subnet.
#[derive(
    Debug,
    Copy,
    Clone,
    Serialize,
    Deserialize,
    Eq,
    Hash,
    PartialEq,
    PartialOrd,
    Ord,
    JsonSchema,
)]
pub struct InterfaceAddress {
    pub addr: Ipv4Addr,
    pub prefix_length: u8,
}

impl InterfaceAddress {
    pub fn new(addr: Ipv4Addr, prefix_length: u8) -> Self {
        Self {
            addr,
            prefix_length,
        }
    }

    /// The subnet this address lives on.
    pub fn subnet(&self) -> Prefix4 {
        Prefix4::new(self.addr, self.prefix_length)
    }
}

impl Display for InterfaceAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.prefix_length)
    }
}

/// Per-interface configuration, as extracted from the vendor model.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, JsonSchema)]
pub struct InterfaceConfig {
    /// Addresses owned by this interface. May be empty.
    pub addresses: Vec<InterfaceAddress>,

    /// The VRF the interface belongs to.
    pub vrf: VrfName,

    /// Whether the device answers ARP on this interface for addresses it
    /// can route, not just addresses it owns.
    pub proxy_arp: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Eq, PartialEq, JsonSchema)]
pub struct NodeConfig {
    pub interfaces: BTreeMap<InterfaceName, InterfaceConfig>,
}

#[derive(
    Debug,
    Copy,
    Clone,
    Serialize,
    Deserialize,
    Eq,
    Hash,
    PartialEq,
    PartialOrd,
    Ord,
    JsonSchema,
)]
pub enum RouteProtocol {
    Connected,
    Local,
    Static,
    Ospf,
    Bgp,
}

/// A route as it appears in a RIB: destination prefix, protocol and
/// administrative distance. Next-hop resolution lives in the FIB.
#[derive(
    Debug, Copy, Clone, Serialize, Deserialize, Eq, Hash, PartialEq, JsonSchema,
)]
pub struct Route {
    pub prefix: Prefix4,
    pub protocol: RouteProtocol,
    pub admin_distance: u8,
}

impl Route {
    pub fn new(prefix: Prefix4, protocol: RouteProtocol, admin_distance: u8) -> Self {
        Self {
            prefix,
            protocol,
            admin_distance,
        }
    }
}

// Define a basic ordering on routes so table iteration is deterministic
impl PartialOrd for Route {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Route {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.prefix != other.prefix {
            return self.prefix.cmp(&other.prefix);
        }
        if self.admin_distance != other.admin_distance {
            return self.admin_distance.cmp(&other.admin_distance);
        }
        self.protocol.cmp(&other.protocol)
    }
}

impl Display for Route {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[prefix={}, protocol={:?}, ad={}]",
            self.prefix, self.protocol, self.admin_distance
        )
    }
}

/// The FIB's resolved next hop for a (route, egress interface) pair.
/// `Unset` means "ARP for the destination address itself", typical of
/// connected and interface routes.
#[derive(
    Debug,
    Copy,
    Clone,
    Serialize,
    Deserialize,
    Eq,
    Hash,
    PartialEq,
    PartialOrd,
    Ord,
    JsonSchema,
)]
pub enum NextHop {
    Unset,
    Ip(Ipv4Addr),
}

impl Display for NextHop {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unset => write!(f, "unset"),
            Self::Ip(ip) => write!(f, "{ip}"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::{Edge, Endpoint, InterfaceAddress};
    use dp_common::ip;

    #[test]
    fn test_edge_reverse() {
        let e = Edge::new(
            Endpoint::new("r1", "eth0"),
            Endpoint::new("r2", "eth0"),
        );
        assert_eq!(e.reverse().reverse(), e);
        assert_eq!(e.reverse().head, e.tail);
        assert_eq!(e.to_string(), "r1[eth0] -> r2[eth0]");
    }

    #[test]
    fn test_interface_address_subnet() {
        let a = InterfaceAddress::new(ip!("192.0.2.17"), 24);
        let subnet = a.subnet();
        assert_eq!(subnet.to_string(), "192.0.2.0/24");
        assert!(subnet.contains(a.addr));
    }
}
