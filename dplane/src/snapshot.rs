// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The immutable input bundle the analysis runs over. Upstream code
//! (vendor extraction, data-plane computation, topology discovery) builds
//! one of these; nothing here ever mutates it.

use crate::error::Error;
use crate::fib::Fib;
use crate::rib::Rib;
use crate::topology::Topology;
use crate::types::{InterfaceConfig, NodeConfig, NodeName, VrfName};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub configurations: BTreeMap<NodeName, NodeConfig>,
    pub ribs: BTreeMap<NodeName, BTreeMap<VrfName, Rib>>,
    pub fibs: BTreeMap<NodeName, BTreeMap<VrfName, Fib>>,
    pub topology: Topology,
}

impl Snapshot {
    pub fn node(&self, node: &str) -> Result<&NodeConfig, Error> {
        self.configurations
            .get(node)
            .ok_or_else(|| Error::MissingNode(node.to_string()))
    }

    pub fn interface(
        &self,
        node: &str,
        interface: &str,
    ) -> Result<&InterfaceConfig, Error> {
        self.node(node)?.interfaces.get(interface).ok_or_else(|| {
            Error::UnknownInterface {
                node: node.to_string(),
                interface: interface.to_string(),
            }
        })
    }

    pub fn rib(&self, node: &str, vrf: &str) -> Result<&Rib, Error> {
        self.ribs
            .get(node)
            .and_then(|vrfs| vrfs.get(vrf))
            .ok_or_else(|| Error::MissingRib {
                node: node.to_string(),
                vrf: vrf.to_string(),
            })
    }

    pub fn fib(&self, node: &str, vrf: &str) -> Result<&Fib, Error> {
        self.fibs
            .get(node)
            .and_then(|vrfs| vrfs.get(vrf))
            .ok_or_else(|| Error::MissingFib {
                node: node.to_string(),
                vrf: vrf.to_string(),
            })
    }

    /// Every VRF name that appears on a node, whether from its FIBs or
    /// from interface membership. A VRF with interfaces but no routes is
    /// legitimate; it just contributes empty spaces.
    pub fn vrfs_of(&self, node: &str) -> BTreeSet<VrfName> {
        let mut vrfs: BTreeSet<VrfName> = self
            .fibs
            .get(node)
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default();
        if let Some(config) = self.configurations.get(node) {
            vrfs.extend(config.interfaces.values().map(|i| i.vrf.clone()));
        }
        vrfs
    }
}
