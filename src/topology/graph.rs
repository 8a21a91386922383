//! Undirected graph used for both the substrate and virtual networks.

use std::collections::{BTreeMap, BTreeSet};

use super::types::{EdgeAttrs, EdgeKey, NodeId};

/// Undirected graph keyed by canonical edges.
///
/// A `BTreeMap` keeps iteration deterministic, so saving a graph always
/// produces the same file for the same state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Graph {
    edges: BTreeMap<EdgeKey, EdgeAttrs>,
}

/// The substrate network. Edge bandwidth is residual capacity.
pub type PhysicalNetwork = Graph;

/// A virtual network request. Edge bandwidth is the requested demand.
pub type VirtualNetwork = Graph;

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an undirected edge, replacing the attributes of an existing one.
    ///
    /// Returns the previous attributes if the edge was already present.
    pub fn add_edge(&mut self, a: NodeId, b: NodeId, bandwidth: i64, cost: i64) -> Option<EdgeAttrs> {
        self.edges.insert(EdgeKey::new(a, b), EdgeAttrs { bandwidth, cost })
    }

    pub fn edge(&self, key: EdgeKey) -> Option<&EdgeAttrs> {
        self.edges.get(&key)
    }

    pub(crate) fn edge_mut(&mut self, key: EdgeKey) -> Option<&mut EdgeAttrs> {
        self.edges.get_mut(&key)
    }

    /// Bandwidth of the edge between `a` and `b` in either orientation
    pub fn bandwidth(&self, a: NodeId, b: NodeId) -> Option<i64> {
        self.edge(EdgeKey::new(a, b)).map(|attrs| attrs.bandwidth)
    }

    /// Iterate over all edges in canonical order
    pub fn edges(&self) -> impl Iterator<Item = (EdgeKey, &EdgeAttrs)> + '_ {
        self.edges.iter().map(|(key, attrs)| (*key, attrs))
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// All nodes that appear as an endpoint of at least one edge
    pub fn nodes(&self) -> BTreeSet<NodeId> {
        self.edges
            .keys()
            .flat_map(|key| [key.u(), key.v()])
            .collect()
    }

    pub fn node_count(&self) -> usize {
        self.nodes().len()
    }

    /// Sum of the bandwidth over every edge
    pub fn total_bandwidth(&self) -> i64 {
        self.edges.values().map(|attrs| attrs.bandwidth).sum()
    }
}
