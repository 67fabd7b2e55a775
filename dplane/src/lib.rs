// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Forwarding-and-ARP reachability analysis.
//!
//! Given an immutable snapshot of a network's data plane (per-node per-VRF
//! RIBs and FIBs, interface configurations and an adjacency topology), this
//! crate partitions the IPv4 destination space seen out of every
//! (node, VRF, interface) into symbolic outcome sets: delivered over a
//! specific edge after successful ARP, neighbor-unreachable, null-routed,
//! delivered to an unmodeled host on a local subnet, or exiting the modeled
//! network. Everything is pure set algebra over [ipspace::IpSpace]; no
//! packets are simulated and the snapshot is never mutated.

pub mod analysis;
pub mod arp;
pub mod classify;
pub mod edge;
pub mod error;
pub mod fib;
pub mod ownership;
pub mod rib;
pub mod snapshot;
pub mod topology;
pub mod types;

mod log;

pub use analysis::{AnalysisParams, ForwardingAnalysis};
pub use snapshot::Snapshot;
pub use types::*;

pub const COMPONENT_DPLANE: &str = "dplane";
pub const MOD_ANALYSIS: &str = "analysis";

/// FIB egress sentinel for routes that discard traffic.
pub const NULL_INTERFACE: &str = "null0";

/// Interface subnets whose prefix length is at most this are considered
/// host subnets: an unanswered ARP there is assumed to be an unmodeled
/// live host. Longer ones are point-to-point/infrastructure links whose
/// silent far side means the packet left the modeled network.
pub const DEFAULT_HOST_SUBNET_MAX_PREFIX_LENGTH: u8 = 29;
