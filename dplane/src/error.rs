// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Input-consistency violations. Given a correctly computed data plane
//! these never fire; any of them aborts the whole analysis pass, since
//! later stages index unconditionally into earlier results.

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("no configuration for node {0}")]
    MissingNode(String),

    #[error("node {node} has no interface {interface}")]
    UnknownInterface { node: String, interface: String },

    #[error("no rib for node {node} vrf {vrf}")]
    MissingRib { node: String, vrf: String },

    #[error("no fib for node {node} vrf {vrf}")]
    MissingFib { node: String, vrf: String },

    #[error("fib for node {node} vrf {vrf} references route {route} absent from the rib")]
    RouteNotInRib {
        node: String,
        vrf: String,
        route: String,
    },

    #[error("edge {0} references an endpoint absent from the configurations")]
    DanglingEdge(String),
}
