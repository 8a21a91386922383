//! Network topology module.
//!
//! This module contains the in-memory graph shared by the substrate network
//! and every virtual network request, together with its CSV representation.

pub mod types;
pub mod graph;
pub mod csv_io;

// Re-export key types and functions for easier access
pub use types::{EdgeAttrs, EdgeKey, NodeId};
pub use graph::{Graph, PhysicalNetwork, VirtualNetwork};
pub use csv_io::{load_topology, parse_topology, save_topology, TopologyError};
