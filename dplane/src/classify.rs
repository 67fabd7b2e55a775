// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Route classification: split each VRF's FIB into, per egress interface,
//! routes that ARP for the destination itself and routes that ARP for a
//! configured next hop, each annotated with the addresses it actually
//! matches after longest-prefix-match overrides. Null-routed space is
//! pulled out here as well.

use crate::error::Error;
use crate::fib::Fib;
use crate::rib::Rib;
use crate::types::{InterfaceName, NextHop, Route};
use ipspace::IpSpace;
use std::collections::{BTreeMap, BTreeSet};
use std::net::Ipv4Addr;

/// A next-hop-is-target route: the concrete addresses to ARP for, plus the
/// destination space the route matches.
#[derive(Debug, Clone)]
pub struct NextHopRoute {
    pub next_hops: BTreeSet<Ipv4Addr>,
    pub matching: IpSpace,
}

/// Routes out one interface, split by what the device ARPs for. The two
/// groups are disjoint: a route whose resolved next-hop set contains the
/// unset sentinel belongs to `dest_ip` even if concrete next hops are also
/// present.
#[derive(Debug, Clone, Default)]
pub struct InterfaceRoutes {
    pub dest_ip: BTreeMap<Route, IpSpace>,
    pub next_hop: BTreeMap<Route, NextHopRoute>,
}

impl InterfaceRoutes {
    /// Union of the matched addresses of the destination-is-target routes.
    pub fn dest_ip_space(&self) -> IpSpace {
        IpSpace::union(self.dest_ip.values().cloned())
    }

    /// Everything routed out this interface, both groups.
    pub fn routed_ips(&self) -> IpSpace {
        IpSpace::union(
            self.dest_ip
                .values()
                .cloned()
                .chain(self.next_hop.values().map(|r| r.matching.clone())),
        )
    }
}

/// Classification of one (node, VRF): per-interface route groups plus the
/// VRF-scoped null-routed and routable spaces.
#[derive(Debug, Clone, Default)]
pub struct VrfClassification {
    pub interfaces: BTreeMap<InterfaceName, InterfaceRoutes>,
    pub null_routed: IpSpace,
    pub routable: IpSpace,
}

pub fn classify_vrf(
    node: &str,
    vrf: &str,
    rib: &Rib,
    fib: &Fib,
) -> Result<VrfClassification, Error> {
    let matching = |route: &Route| -> Result<IpSpace, Error> {
        rib.matching_ips(route).ok_or_else(|| Error::RouteNotInRib {
            node: node.to_string(),
            vrf: vrf.to_string(),
            route: route.to_string(),
        })
    };

    let mut interfaces: BTreeMap<InterfaceName, InterfaceRoutes> =
        BTreeMap::new();
    for (iface, group) in fib.forwarding_groups() {
        let entry = interfaces.entry(iface.clone()).or_default();
        for (route, next_hops) in group {
            let matched = matching(route)?;
            if next_hops.contains(&NextHop::Unset) {
                entry.dest_ip.insert(*route, matched);
            } else {
                let concrete: BTreeSet<Ipv4Addr> = next_hops
                    .iter()
                    .filter_map(|nh| match nh {
                        NextHop::Ip(ip) => Some(*ip),
                        NextHop::Unset => None,
                    })
                    .collect();
                entry.next_hop.insert(
                    *route,
                    NextHopRoute {
                        next_hops: concrete,
                        matching: matched,
                    },
                );
            }
        }
    }

    let null_routed = IpSpace::union(
        fib.null_routed_routes()
            .map(matching)
            .collect::<Result<Vec<_>, Error>>()?,
    );

    Ok(VrfClassification {
        interfaces,
        null_routed,
        routable: rib.routable_ips(),
    })
}
