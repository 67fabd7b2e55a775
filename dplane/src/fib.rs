// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-node, per-VRF forwarding table view: routes grouped by the egress
//! interface longest-prefix-match resolution chose for them, each with its
//! resolved set of final next hops. The [crate::NULL_INTERFACE] group
//! marks routes that discard traffic.

use crate::types::{InterfaceName, NextHop, Route};
use crate::NULL_INTERFACE;
use std::collections::{BTreeMap, BTreeSet};

pub type NextHops = BTreeSet<NextHop>;

#[derive(Debug, Clone, Default)]
pub struct Fib {
    routes_by_egress: BTreeMap<InterfaceName, BTreeMap<Route, NextHops>>,
}

impl Fib {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a (route, egress interface) pair with its resolved next hops.
    /// A route may resolve out several interfaces (ECMP); call once per
    /// interface.
    pub fn add<I>(&mut self, interface: impl Into<InterfaceName>, route: Route, next_hops: I)
    where
        I: IntoIterator<Item = NextHop>,
    {
        self.routes_by_egress
            .entry(interface.into())
            .or_default()
            .entry(route)
            .or_default()
            .extend(next_hops);
    }

    pub fn routes_by_egress_interface(
        &self,
    ) -> &BTreeMap<InterfaceName, BTreeMap<Route, NextHops>> {
        &self.routes_by_egress
    }

    /// Egress groups for real interfaces, null group excluded.
    pub fn forwarding_groups(
        &self,
    ) -> impl Iterator<Item = (&InterfaceName, &BTreeMap<Route, NextHops>)> {
        self.routes_by_egress
            .iter()
            .filter(|(iface, _)| iface.as_str() != NULL_INTERFACE)
    }

    /// Routes whose resolved interface set contains the null sentinel.
    pub fn null_routed_routes(&self) -> impl Iterator<Item = &Route> {
        self.routes_by_egress
            .get(NULL_INTERFACE)
            .into_iter()
            .flat_map(|group| group.keys())
    }
}
