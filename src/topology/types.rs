//! Topology type definitions.
//!
//! Node identifiers, canonical undirected edge keys and per-edge attributes
//! shared by the substrate network and every virtual network.

use std::fmt;

/// Integer label of a node (substrate site or VN-local index)
pub type NodeId = u32;

/// Canonical key of an undirected edge, always stored with `u < v`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey {
    u: NodeId,
    v: NodeId,
}

impl EdgeKey {
    /// Build the canonical key for the undirected edge between `a` and `b`.
    ///
    /// # Examples
    /// ```
    /// use vnesim::topology::EdgeKey;
    ///
    /// assert_eq!(EdgeKey::new(3, 1), EdgeKey::new(1, 3));
    /// assert_eq!(EdgeKey::new(3, 1).endpoints(), (1, 3));
    /// ```
    pub fn new(a: NodeId, b: NodeId) -> Self {
        if a <= b {
            Self { u: a, v: b }
        } else {
            Self { u: b, v: a }
        }
    }

    /// Smaller endpoint
    pub fn u(&self) -> NodeId {
        self.u
    }

    /// Larger endpoint
    pub fn v(&self) -> NodeId {
        self.v
    }

    pub fn endpoints(&self) -> (NodeId, NodeId) {
        (self.u, self.v)
    }
}

impl fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.u, self.v)
    }
}

/// Attributes carried by every edge.
///
/// On the substrate network `bandwidth` is the *residual* capacity and is the
/// only field the simulation mutates. On a virtual network it is the requested
/// demand. `cost` is static in both cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeAttrs {
    pub bandwidth: i64,
    pub cost: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_key_canonical() {
        let key = EdgeKey::new(7, 2);
        assert_eq!(key.u(), 2);
        assert_eq!(key.v(), 7);
        assert_eq!(key.to_string(), "(2, 7)");

        // Self loops keep both endpoints equal
        assert_eq!(EdgeKey::new(4, 4).endpoints(), (4, 4));
    }

    #[test]
    fn test_edge_key_ordering() {
        let mut keys = vec![EdgeKey::new(2, 1), EdgeKey::new(0, 5), EdgeKey::new(1, 0)];
        keys.sort();
        assert_eq!(
            keys,
            vec![EdgeKey::new(0, 1), EdgeKey::new(0, 5), EdgeKey::new(1, 2)]
        );
    }
}
