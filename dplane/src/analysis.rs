// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The full analysis pass.
//!
//! [ForwardingAnalysis::compute] drives the stages in their required
//! order: ownership and route classification, then ARP reply spaces for
//! every interface of every node, then edge resolution (which reads the
//! far end's reply space, hence the barrier), then outcome aggregation.
//! The result is a set of read-only maps computed exactly once per
//! snapshot; recompute wholesale if the RIBs, FIBs or topology change.
//!
//! For every (node, VRF, interface) the outcome spaces — delivered over
//! some edge, neighbor-unreachable, delivered-to-subnet, exits-network —
//! are pairwise disjoint and together cover exactly the addresses routed
//! out that interface. Null-routed space is VRF-scoped and carved out
//! before any interface sees it.

use crate::arp;
use crate::classify::{classify_vrf, VrfClassification};
use crate::edge::{self, ArpReplies};
use crate::error::Error;
use crate::log::dplane_log;
use crate::ownership::{owned_ips, OwnedAddressIndex};
use crate::snapshot::Snapshot;
use crate::types::{
    Edge, InterfaceConfig, InterfaceName, NodeName, VrfName,
};
use crate::DEFAULT_HOST_SUBNET_MAX_PREFIX_LENGTH;
use ipspace::{IpSpace, Prefix4};
use slog::Logger;
use std::collections::{BTreeMap, BTreeSet};
use std::net::Ipv4Addr;

pub type InterfaceSpaces = BTreeMap<NodeName, BTreeMap<InterfaceName, IpSpace>>;
pub type VrfInterfaceSpaces =
    BTreeMap<NodeName, BTreeMap<VrfName, BTreeMap<InterfaceName, IpSpace>>>;
pub type VrfSpaces = BTreeMap<NodeName, BTreeMap<VrfName, IpSpace>>;

/// Policy knobs for outcome aggregation.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisParams {
    /// Configured subnets at most this long are host subnets; longer ones
    /// are infrastructure links. See
    /// [crate::DEFAULT_HOST_SUBNET_MAX_PREFIX_LENGTH].
    pub host_subnet_max_prefix_length: u8,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            host_subnet_max_prefix_length:
                DEFAULT_HOST_SUBNET_MAX_PREFIX_LENGTH,
        }
    }
}

/// The computed result maps. All spaces are present for every key they
/// are defined over; an empty outcome is `IpSpace::Empty`, never a
/// missing entry.
#[derive(Debug, Clone)]
pub struct ForwardingAnalysis {
    arp_replies: ArpReplies,
    arp_true_edge: BTreeMap<Edge, IpSpace>,
    ips_routed_out_interfaces: VrfInterfaceSpaces,
    neighbor_unreachable: VrfInterfaceSpaces,
    delivered_to_subnet: VrfInterfaceSpaces,
    exits_network: VrfInterfaceSpaces,
    null_routed_ips: VrfSpaces,
    routable_ips: VrfSpaces,
    owned_index: OwnedAddressIndex,
}

impl ForwardingAnalysis {
    pub fn compute(
        snapshot: &Snapshot,
        params: &AnalysisParams,
        log: &Logger,
    ) -> Result<Self, Error> {
        // Stage 1: ownership.
        let owned_index = OwnedAddressIndex::new(&snapshot.configurations);
        let mut owned: InterfaceSpaces = BTreeMap::new();
        for (node, config) in &snapshot.configurations {
            for (iface, ic) in &config.interfaces {
                owned
                    .entry(node.clone())
                    .or_default()
                    .insert(iface.clone(), owned_ips(ic));
            }
        }

        // Stage 2: route classification, per (node, vrf).
        let mut classifications: BTreeMap<
            NodeName,
            BTreeMap<VrfName, VrfClassification>,
        > = BTreeMap::new();
        for (node, vrfs) in &snapshot.fibs {
            for (vrf, fib) in vrfs {
                let rib = snapshot.rib(node, vrf)?;
                let classification = classify_vrf(node, vrf, rib, fib)?;
                for iface in classification.interfaces.keys() {
                    // Every FIB egress must be a configured interface.
                    snapshot.interface(node, iface)?;
                }
                classifications
                    .entry(node.clone())
                    .or_default()
                    .insert(vrf.clone(), classification);
            }
        }
        dplane_log!(
            log,
            debug,
            "classified routes for {} nodes",
            classifications.len()
        );

        // VRF-scoped spaces. A VRF with interfaces but no routes simply
        // contributes empty spaces.
        let mut routable_ips: VrfSpaces = BTreeMap::new();
        let mut null_routed_ips: VrfSpaces = BTreeMap::new();
        for node in snapshot.configurations.keys() {
            for vrf in snapshot.vrfs_of(node) {
                let classification =
                    classifications.get(node).and_then(|m| m.get(&vrf));
                let routable = match classification {
                    Some(c) => c.routable.clone(),
                    None => snapshot
                        .ribs
                        .get(node)
                        .and_then(|m| m.get(&vrf))
                        .map(|rib| rib.routable_ips())
                        .unwrap_or(IpSpace::Empty),
                };
                let null_routed = classification
                    .map(|c| c.null_routed.clone())
                    .unwrap_or(IpSpace::Empty);
                routable_ips
                    .entry(node.clone())
                    .or_default()
                    .insert(vrf.clone(), routable);
                null_routed_ips
                    .entry(node.clone())
                    .or_default()
                    .insert(vrf.clone(), null_routed);
            }
        }

        let mut ips_routed_out_interfaces = seeded_interface_spaces(snapshot);
        let mut routed_out_by_iface: BTreeMap<
            NodeName,
            BTreeMap<InterfaceName, Vec<IpSpace>>,
        > = BTreeMap::new();
        for (node, vrfs) in &classifications {
            for (vrf, classification) in vrfs {
                for (iface, routes) in &classification.interfaces {
                    let routed = routes.routed_ips();
                    ips_routed_out_interfaces
                        .entry(node.clone())
                        .or_default()
                        .entry(vrf.clone())
                        .or_default()
                        .insert(iface.clone(), routed.clone());
                    routed_out_by_iface
                        .entry(node.clone())
                        .or_default()
                        .entry(iface.clone())
                        .or_default()
                        .push(routed);
                }
            }
        }

        // Stage 3: ARP reply spaces for every interface of every node.
        // Edge resolution reads the far end's space, so all of this must
        // exist before any edge is resolved.
        let empty = IpSpace::Empty;
        let mut arp_replies: ArpReplies = BTreeMap::new();
        for (node, config) in &snapshot.configurations {
            for (iface, ic) in &config.interfaces {
                let owned_here = &owned[node][iface];
                let routable = routable_ips
                    .get(node)
                    .and_then(|m| m.get(&ic.vrf))
                    .unwrap_or(&empty);
                let routed_out_here = routed_out_by_iface
                    .get(node)
                    .and_then(|m| m.get(iface))
                    .map(|spaces| IpSpace::union(spaces.iter().cloned()))
                    .unwrap_or(IpSpace::Empty);
                arp_replies.entry(node.clone()).or_default().insert(
                    iface.clone(),
                    arp::arp_replies(ic, owned_here, routable, &routed_out_here),
                );
            }
        }
        dplane_log!(log, debug, "arp reply spaces complete");

        // Stage 4: edge resolution.
        let resolution =
            edge::resolve(&snapshot.topology, &classifications, &arp_replies)?;
        dplane_log!(
            log,
            debug,
            "resolved {} edges",
            resolution.arp_true_edge.len()
        );

        // Stage 5: outcome aggregation. The no-neighbor-answers candidate
        // space splits three ways: addresses owned by some modeled device
        // are genuinely stuck; unowned addresses on a host subnet are
        // assumed delivered to an unmodeled host; unowned addresses on an
        // infrastructure link are assumed to leave the modeled network.
        let owned_space = owned_index.owned_space().clone();
        let not_owned = owned_space.complement();
        let threshold = params.host_subnet_max_prefix_length;
        let mut neighbor_unreachable = seeded_interface_spaces(snapshot);
        let mut delivered_to_subnet = seeded_interface_spaces(snapshot);
        let mut exits_network = seeded_interface_spaces(snapshot);
        for (node, vrfs) in &resolution.unreachable_candidate {
            for (vrf, ifaces) in vrfs {
                for (iface, candidate) in ifaces {
                    let ic = snapshot.interface(node, iface)?;
                    let host = subnet_space(ic, |len| len <= threshold);
                    let infra = subnet_space(ic, |len| len > threshold);

                    let d2s = IpSpace::intersection([
                        candidate.clone(),
                        not_owned.clone(),
                        host.clone(),
                    ]);
                    let en = IpSpace::intersection([
                        candidate.clone(),
                        not_owned.clone(),
                        infra.clone(),
                        host.complement(),
                    ]);
                    // Whatever is not assumed delivered off-model stays
                    // stuck on this interface.
                    let assumed_external = IpSpace::intersection([
                        not_owned.clone(),
                        IpSpace::union([host, infra]),
                    ]);
                    let nu = IpSpace::intersection([
                        candidate.clone(),
                        assumed_external.complement(),
                    ]);

                    for (map, space) in [
                        (&mut delivered_to_subnet, d2s),
                        (&mut exits_network, en),
                        (&mut neighbor_unreachable, nu),
                    ] {
                        map.entry(node.clone())
                            .or_default()
                            .entry(vrf.clone())
                            .or_default()
                            .insert(iface.clone(), space);
                    }
                }
            }
        }
        dplane_log!(log, info, "forwarding analysis complete");

        Ok(Self {
            arp_replies,
            arp_true_edge: resolution.arp_true_edge,
            ips_routed_out_interfaces,
            neighbor_unreachable,
            delivered_to_subnet,
            exits_network,
            null_routed_ips,
            routable_ips,
            owned_index,
        })
    }

    pub fn arp_replies(&self) -> &ArpReplies {
        &self.arp_replies
    }

    pub fn arp_replies_for(&self, node: &str, iface: &str) -> Option<&IpSpace> {
        self.arp_replies.get(node).and_then(|m| m.get(iface))
    }

    pub fn arp_true_edge(&self) -> &BTreeMap<Edge, IpSpace> {
        &self.arp_true_edge
    }

    pub fn ips_routed_out_interfaces(&self) -> &VrfInterfaceSpaces {
        &self.ips_routed_out_interfaces
    }

    pub fn neighbor_unreachable(&self) -> &VrfInterfaceSpaces {
        &self.neighbor_unreachable
    }

    pub fn delivered_to_subnet(&self) -> &VrfInterfaceSpaces {
        &self.delivered_to_subnet
    }

    pub fn exits_network(&self) -> &VrfInterfaceSpaces {
        &self.exits_network
    }

    pub fn null_routed_ips(&self) -> &VrfSpaces {
        &self.null_routed_ips
    }

    pub fn routable_ips(&self) -> &VrfSpaces {
        &self.routable_ips
    }

    /// Does `ip` belong to any modeled interface subnet anywhere in the
    /// network?
    pub fn is_address_in_snapshot(&self, ip: Ipv4Addr) -> bool {
        self.owned_index.is_address_in_snapshot(ip)
    }
}

fn seeded_interface_spaces(snapshot: &Snapshot) -> VrfInterfaceSpaces {
    let mut map = VrfInterfaceSpaces::new();
    for (node, config) in &snapshot.configurations {
        for (iface, ic) in &config.interfaces {
            map.entry(node.clone())
                .or_default()
                .entry(ic.vrf.clone())
                .or_default()
                .insert(iface.clone(), IpSpace::Empty);
        }
    }
    map
}

/// Union of the interface's configured subnets whose prefix length passes
/// `keep`.
fn subnet_space(config: &InterfaceConfig, keep: impl Fn(u8) -> bool) -> IpSpace {
    let subnets: BTreeSet<Prefix4> = config
        .addresses
        .iter()
        .filter(|a| keep(a.prefix_length))
        .map(|a| a.subnet())
        .collect();
    IpSpace::union(subnets.into_iter().map(IpSpace::from))
}
