// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The physical/logical adjacency graph: a directed edge set over
//! (node, interface) endpoints, with a precomputed neighbor index.

use crate::types::{Edge, Endpoint};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default)]
pub struct Topology {
    edges: BTreeSet<Edge>,
    adjacency: BTreeMap<Endpoint, BTreeSet<Endpoint>>,
}

impl Topology {
    pub fn new<I>(edges: I) -> Self
    where
        I: IntoIterator<Item = Edge>,
    {
        let edges: BTreeSet<Edge> = edges.into_iter().collect();
        let mut adjacency: BTreeMap<Endpoint, BTreeSet<Endpoint>> =
            BTreeMap::new();
        for edge in &edges {
            adjacency
                .entry(edge.tail.clone())
                .or_default()
                .insert(edge.head.clone());
        }
        Self { edges, adjacency }
    }

    /// Build a topology from undirected links, inserting both directions
    /// of each.
    pub fn symmetric<I>(links: I) -> Self
    where
        I: IntoIterator<Item = (Endpoint, Endpoint)>,
    {
        Self::new(links.into_iter().flat_map(|(a, b)| {
            let forward = Edge::new(a, b);
            let reverse = forward.reverse();
            [forward, reverse]
        }))
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    pub fn neighbors(&self, endpoint: &Endpoint) -> impl Iterator<Item = &Endpoint> {
        self.adjacency.get(endpoint).into_iter().flatten()
    }
}
