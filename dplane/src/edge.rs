// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Edge resolution: for every adjacency, which destinations successfully
//! ARP across it, and for every (node, VRF, interface), which routed
//! destinations no neighbor answers for at all.
//!
//! This stage reads the far end's reply space, so it must not start until
//! ARP reply spaces exist for every interface of every node.

use crate::classify::VrfClassification;
use crate::error::Error;
use crate::topology::Topology;
use crate::types::{Edge, Endpoint, InterfaceName, NodeName, VrfName};
use ipspace::IpSpace;
use itertools::Itertools;
use std::collections::BTreeMap;

pub type ArpReplies = BTreeMap<NodeName, BTreeMap<InterfaceName, IpSpace>>;

/// Output of edge resolution. `unreachable_candidate` is the raw
/// no-neighbor-answers space per (node, VRF, interface), before the
/// aggregator splits it into neighbor-unreachable, delivered-to-subnet and
/// exits-network.
#[derive(Debug, Clone, Default)]
pub struct EdgeResolution {
    pub arp_true_edge: BTreeMap<Edge, IpSpace>,
    pub unreachable_candidate:
        BTreeMap<NodeName, BTreeMap<VrfName, BTreeMap<InterfaceName, IpSpace>>>,
}

fn replies_at<'a>(
    arp_replies: &'a ArpReplies,
    endpoint: &Endpoint,
    edge: &Edge,
) -> Result<&'a IpSpace, Error> {
    arp_replies
        .get(&endpoint.node)
        .and_then(|ifaces| ifaces.get(&endpoint.interface))
        .ok_or_else(|| Error::DanglingEdge(edge.to_string()))
}

/// Union, over every edge leaving `endpoint`, of the far end's reply
/// space: "does ANY neighbor answer."
pub fn someone_replies(
    topology: &Topology,
    arp_replies: &ArpReplies,
) -> Result<BTreeMap<Endpoint, IpSpace>, Error> {
    let pairs: Vec<(Endpoint, IpSpace)> = topology
        .edges()
        .map(|edge| {
            // Both endpoints must be configured interfaces.
            replies_at(arp_replies, &edge.tail, edge)?;
            let head = replies_at(arp_replies, &edge.head, edge)?;
            Ok((edge.tail.clone(), head.clone()))
        })
        .collect::<Result<_, Error>>()?;
    Ok(pairs
        .into_iter()
        .into_group_map()
        .into_iter()
        .map(|(endpoint, spaces)| (endpoint, IpSpace::union(spaces)))
        .collect())
}

pub fn resolve(
    topology: &Topology,
    classifications: &BTreeMap<NodeName, BTreeMap<VrfName, VrfClassification>>,
    arp_replies: &ArpReplies,
) -> Result<EdgeResolution, Error> {
    let someone = someone_replies(topology, arp_replies)?;
    let empty = IpSpace::Empty;

    // Every topology edge gets an entry, Empty when nothing resolves.
    let mut edge_spaces: BTreeMap<Edge, Vec<IpSpace>> = topology
        .edges()
        .map(|e| (e.clone(), Vec::new()))
        .collect();
    let mut unreachable_candidate: BTreeMap<
        NodeName,
        BTreeMap<VrfName, BTreeMap<InterfaceName, IpSpace>>,
    > = BTreeMap::new();

    for (node, vrfs) in classifications {
        for (vrf, classification) in vrfs {
            for (iface, routes) in &classification.interfaces {
                let endpoint = Endpoint::new(node.clone(), iface.clone());
                let someone_here = someone.get(&endpoint).unwrap_or(&empty);

                // Destination-is-target routes: an address departs over an
                // edge iff a candidate route matches it AND the far end
                // answers for exactly that address.
                let dest_space = routes.dest_ip_space();
                let mut unreachable = Vec::new();
                if !dest_space.is_empty_space() {
                    for neighbor in topology.neighbors(&endpoint) {
                        let edge =
                            Edge::new(endpoint.clone(), neighbor.clone());
                        let replies = replies_at(arp_replies, neighbor, &edge)?;
                        let resolved = IpSpace::intersection([
                            dest_space.clone(),
                            replies.clone(),
                        ]);
                        if !resolved.is_empty_space() {
                            edge_spaces
                                .get_mut(&edge)
                                .ok_or_else(|| {
                                    Error::DanglingEdge(edge.to_string())
                                })?
                                .push(resolved);
                        }
                    }
                    unreachable.push(if someone_here.is_empty_space() {
                        dest_space.clone()
                    } else {
                        IpSpace::rejecting(someone_here.clone())
                            .then_permitting(dest_space.clone())
                            .build()
                    });
                }

                // Next-hop-is-target routes: the route's whole matched
                // space departs over an edge iff one of its concrete next
                // hops is inside that neighbor's reply space.
                for nh_route in routes.next_hop.values() {
                    for neighbor in topology.neighbors(&endpoint) {
                        let edge =
                            Edge::new(endpoint.clone(), neighbor.clone());
                        let replies = replies_at(arp_replies, neighbor, &edge)?;
                        if nh_route
                            .next_hops
                            .iter()
                            .any(|nh| replies.contains(*nh))
                        {
                            edge_spaces
                                .get_mut(&edge)
                                .ok_or_else(|| {
                                    Error::DanglingEdge(edge.to_string())
                                })?
                                .push(nh_route.matching.clone());
                        }
                    }
                    if !nh_route
                        .next_hops
                        .iter()
                        .any(|nh| someone_here.contains(*nh))
                    {
                        unreachable.push(nh_route.matching.clone());
                    }
                }

                unreachable_candidate
                    .entry(node.clone())
                    .or_default()
                    .entry(vrf.clone())
                    .or_default()
                    .insert(iface.clone(), IpSpace::union(unreachable));
            }
        }
    }

    let arp_true_edge = edge_spaces
        .into_iter()
        .map(|(edge, spaces)| (edge, IpSpace::union(spaces)))
        .collect();

    Ok(EdgeResolution {
        arp_true_edge,
        unreachable_candidate,
    })
}

#[cfg(test)]
mod test {
    use super::{resolve, someone_replies, ArpReplies};
    use crate::classify::{InterfaceRoutes, NextHopRoute, VrfClassification};
    use crate::topology::Topology;
    use crate::types::{Edge, Endpoint, Route, RouteProtocol};
    use dp_common::{ip, prefix};
    use ipspace::{IpSpace, Prefix4};
    use std::collections::{BTreeMap, BTreeSet};

    fn replies(entries: &[(&str, &str, IpSpace)]) -> ArpReplies {
        let mut map = ArpReplies::new();
        for (node, iface, space) in entries {
            map.entry(node.to_string())
                .or_default()
                .insert(iface.to_string(), space.clone());
        }
        map
    }

    fn host_space(ip: &str) -> IpSpace {
        IpSpace::from(ip.parse::<std::net::Ipv4Addr>().expect("ip address"))
    }

    #[test]
    fn test_someone_replies_union() {
        let topo = Topology::symmetric([
            (Endpoint::new("r1", "eth0"), Endpoint::new("r2", "eth0")),
            (Endpoint::new("r1", "eth0"), Endpoint::new("r3", "eth0")),
        ]);
        let arp = replies(&[
            ("r1", "eth0", host_space("192.0.2.1")),
            ("r2", "eth0", host_space("192.0.2.2")),
            ("r3", "eth0", host_space("192.0.2.3")),
        ]);
        let someone = someone_replies(&topo, &arp).expect("someone replies");

        let at_r1 = &someone[&Endpoint::new("r1", "eth0")];
        assert!(at_r1.contains(ip!("192.0.2.2")));
        assert!(at_r1.contains(ip!("192.0.2.3")));
        assert!(!at_r1.contains(ip!("192.0.2.1")));
    }

    #[test]
    fn test_dangling_edge_is_fatal() {
        let topo = Topology::new([Edge::new(
            Endpoint::new("r1", "eth0"),
            Endpoint::new("ghost", "eth0"),
        )]);
        let arp = replies(&[("r1", "eth0", host_space("192.0.2.1"))]);
        assert!(matches!(
            someone_replies(&topo, &arp),
            Err(crate::error::Error::DanglingEdge(_))
        ));
    }

    #[test]
    fn test_shared_segment_resolution() {
        // r1 routes a destination toward a segment with two neighbors;
        // only r2 answers for it.
        let r1 = Endpoint::new("r1", "eth0");
        let r2 = Endpoint::new("r2", "eth0");
        let r3 = Endpoint::new("r3", "eth0");
        let topo = Topology::symmetric([
            (r1.clone(), r2.clone()),
            (r1.clone(), r3.clone()),
        ]);
        let arp = replies(&[
            ("r1", "eth0", host_space("192.0.2.1")),
            ("r2", "eth0", host_space("192.0.2.2")),
            ("r3", "eth0", host_space("192.0.2.3")),
        ]);

        let p: Prefix4 = prefix!("192.0.2.0/24");
        let connected =
            Route::new(p, RouteProtocol::Connected, 0);
        let mut routes = InterfaceRoutes::default();
        routes.dest_ip.insert(connected, IpSpace::from(p));
        let mut classification = VrfClassification::default();
        classification.interfaces.insert("eth0".to_string(), routes);

        let mut classifications = BTreeMap::new();
        classifications.insert(
            "r1".to_string(),
            BTreeMap::from([("default".to_string(), classification)]),
        );

        let resolution =
            resolve(&topo, &classifications, &arp).expect("resolve");

        let to_r2 = &resolution.arp_true_edge[&Edge::new(r1.clone(), r2)];
        let to_r3 = &resolution.arp_true_edge[&Edge::new(r1.clone(), r3)];
        assert!(to_r2.contains(ip!("192.0.2.2")));
        assert!(!to_r2.contains(ip!("192.0.2.3")));
        assert!(to_r3.contains(ip!("192.0.2.3")));
        assert!(!to_r3.contains(ip!("192.0.2.2")));

        // Nobody answers for .77, so it is stuck on this interface.
        let candidate =
            &resolution.unreachable_candidate["r1"]["default"]["eth0"];
        assert!(candidate.contains(ip!("192.0.2.77")));
        assert!(!candidate.contains(ip!("192.0.2.2")));
    }

    #[test]
    fn test_next_hop_resolution() {
        let r1 = Endpoint::new("r1", "eth0");
        let r2 = Endpoint::new("r2", "eth0");
        let topo = Topology::symmetric([(r1.clone(), r2.clone())]);
        let arp = replies(&[
            ("r1", "eth0", host_space("192.0.2.1")),
            ("r2", "eth0", host_space("192.0.2.2")),
        ]);

        let reachable = Route::new(
            prefix!("10.0.0.0/24"),
            RouteProtocol::Static,
            1,
        );
        let orphaned = Route::new(
            prefix!("10.9.0.0/24"),
            RouteProtocol::Static,
            1,
        );
        let mut routes = InterfaceRoutes::default();
        routes.next_hop.insert(
            reachable,
            NextHopRoute {
                next_hops: BTreeSet::from([ip!("192.0.2.2")]),
                matching: IpSpace::from(reachable.prefix),
            },
        );
        // Next hop nobody owns anymore.
        routes.next_hop.insert(
            orphaned,
            NextHopRoute {
                next_hops: BTreeSet::from([ip!("192.0.2.9")]),
                matching: IpSpace::from(orphaned.prefix),
            },
        );
        let mut classification = VrfClassification::default();
        classification.interfaces.insert("eth0".to_string(), routes);
        let classifications = BTreeMap::from([(
            "r1".to_string(),
            BTreeMap::from([("default".to_string(), classification)]),
        )]);

        let resolution =
            resolve(&topo, &classifications, &arp).expect("resolve");

        let over_edge = &resolution.arp_true_edge[&Edge::new(r1, r2)];
        assert!(over_edge.contains(ip!("10.0.0.50")));
        assert!(!over_edge.contains(ip!("10.9.0.50")));

        let candidate =
            &resolution.unreachable_candidate["r1"]["default"]["eth0"];
        assert!(candidate.contains(ip!("10.9.0.50")));
        assert!(!candidate.contains(ip!("10.0.0.50")));
    }
}
