// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-node, per-VRF routing table view.
//!
//! The RIB here is already a fixed point of the routing protocols; this
//! module only answers symbolic questions about it. `matching_ips` turns
//! longest-prefix-match into set algebra: the addresses a route actually
//! matches are its prefix minus every strictly more specific prefix in the
//! same table.

use crate::types::Route;
use ipspace::{IpSpace, Prefix4};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default)]
pub struct Rib {
    routes: BTreeSet<Route>,
    discarded: BTreeSet<Route>,
}

impl Rib {
    pub fn new<I>(routes: I) -> Self
    where
        I: IntoIterator<Item = Route>,
    {
        Self {
            routes: routes.into_iter().collect(),
            discarded: BTreeSet::new(),
        }
    }

    /// Build a RIB where some routes discard traffic (null routes). The
    /// discarded routes participate in longest-prefix matching but are
    /// excluded from `routable_ips`.
    pub fn with_discarded<I, J>(routes: I, discarded: J) -> Self
    where
        I: IntoIterator<Item = Route>,
        J: IntoIterator<Item = Route>,
    {
        let discarded: BTreeSet<Route> = discarded.into_iter().collect();
        let mut routes: BTreeSet<Route> = routes.into_iter().collect();
        routes.extend(discarded.iter().copied());
        Self { routes, discarded }
    }

    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }

    pub fn contains(&self, route: &Route) -> bool {
        self.routes.contains(route)
    }

    /// The addresses this route matches after accounting for more-specific
    /// overrides: reject every strictly longer prefix present in the table,
    /// then permit the route's own prefix. Returns `None` if the route is
    /// not in this RIB.
    pub fn matching_ips(&self, route: &Route) -> Option<IpSpace> {
        if !self.routes.contains(route) {
            return None;
        }
        let prefix = route.prefix;
        let more_specific: BTreeSet<Prefix4> = self
            .routes
            .iter()
            .map(|r| r.prefix)
            .filter(|p| p.length > prefix.length && p.within(&prefix))
            .collect();

        if more_specific.is_empty() {
            return Some(prefix.into());
        }
        let mut builder = ipspace::AclBuilder::new();
        for p in more_specific {
            builder = builder.then_rejecting(p);
        }
        Some(builder.then_permitting(prefix).build())
    }

    /// Union over the prefixes of all non-discarded routes: everything the
    /// VRF has any way to forward.
    pub fn routable_ips(&self) -> IpSpace {
        let prefixes: BTreeSet<Prefix4> = self
            .routes
            .iter()
            .filter(|r| !self.discarded.contains(r))
            .map(|r| r.prefix)
            .collect();
        IpSpace::union(prefixes.into_iter().map(IpSpace::from))
    }
}
