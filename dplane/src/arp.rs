// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Which destination addresses an interface answers ARP for.
//!
//! The reply space is built as an ordered composition:
//!
//! - an interface with no addresses never answers, full stop.
//! - otherwise it answers for the addresses it owns.
//! - with proxy ARP enabled it additionally answers for anything the VRF
//!   can route, except addresses the device would route back out this same
//!   interface. Answering for those would pull traffic in only to forward
//!   it out the port it arrived on, a resolution loop.
//!
//! Every interface of every node must pass through here before any edge is
//! resolved; the far end's reply space is an input to edge resolution.

use crate::types::InterfaceConfig;
use ipspace::{AclBuilder, IpSpace};

pub fn arp_replies(
    config: &InterfaceConfig,
    owned: &IpSpace,
    routable_ips_for_vrf: &IpSpace,
    ips_routed_out_iface: &IpSpace,
) -> IpSpace {
    if owned.is_empty_space() {
        return IpSpace::Empty;
    }
    if !config.proxy_arp {
        return owned.clone();
    }
    AclBuilder::new()
        .then_permitting(owned.clone())
        .then_rejecting(ips_routed_out_iface.clone())
        .then_permitting(routable_ips_for_vrf.clone())
        .build()
}
