//! Utilization ledger.
//!
//! Tracks the cumulative bandwidth reserved on every substrate edge. The
//! ledger is maintained alongside the residual capacity stored in the
//! substrate graph and must always satisfy
//! `reserved + residual == original capacity` for each edge.
//! Utilization is derived from the two views on demand and never stored.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use log::debug;

use crate::topology::{EdgeKey, PhysicalNetwork};

/// Per-edge cumulative reservation table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UtilizationLedger {
    reserved: BTreeMap<EdgeKey, i64>,
}

impl UtilizationLedger {
    /// Create a ledger with a zero entry for every substrate edge
    pub fn for_network(sn: &PhysicalNetwork) -> Self {
        Self {
            reserved: sn.edges().map(|(key, _)| (key, 0)).collect(),
        }
    }

    /// Reserved bandwidth on `key`, zero for unknown edges
    pub fn reserved(&self, key: EdgeKey) -> i64 {
        self.reserved.get(&key).copied().unwrap_or(0)
    }

    pub fn contains(&self, key: EdgeKey) -> bool {
        self.reserved.contains_key(&key)
    }

    /// Add `delta` to the reservation of `key`, returning the new value
    pub(crate) fn adjust(&mut self, key: EdgeKey, delta: i64) -> i64 {
        let entry = self.reserved.entry(key).or_insert(0);
        *entry = entry.saturating_add(delta);
        *entry
    }

    /// Iterate over all entries in canonical edge order
    pub fn entries(&self) -> impl Iterator<Item = (EdgeKey, i64)> + '_ {
        self.reserved.iter().map(|(key, value)| (*key, *value))
    }

    /// Sum of all reservations
    pub fn total_reserved(&self) -> i64 {
        self.reserved.values().sum()
    }

    /// Utilization of a single edge given its current residual bandwidth.
    ///
    /// An edge with no capacity at all reports zero utilization.
    pub fn utilization(&self, key: EdgeKey, residual: i64) -> f64 {
        let reserved = self.reserved(key) as f64;
        let total = reserved + residual as f64;
        if total <= 0.0 {
            0.0
        } else {
            reserved / total
        }
    }

    /// Utilization of every substrate edge with a nonzero value
    pub fn snapshot(&self, sn: &PhysicalNetwork) -> Vec<(EdgeKey, f64)> {
        sn.edges()
            .map(|(key, attrs)| (key, self.utilization(key, attrs.bandwidth)))
            .filter(|(_, util)| *util > 0.0)
            .collect()
    }

    /// Render a snapshot as `u,v,utilization` lines
    pub fn format_snapshot(&self, sn: &PhysicalNetwork) -> String {
        let mut out = String::new();
        for (key, util) in self.snapshot(sn) {
            let _ = writeln!(out, "{},{},{}", key.u(), key.v(), util);
        }
        out
    }

    /// Write the utilization snapshot for the current state to `path`
    pub fn write_snapshot(&self, sn: &PhysicalNetwork, path: &Path) -> std::io::Result<()> {
        let content = self.format_snapshot(sn);
        debug!("Writing utilization snapshot {:?} ({} edges)", path, content.lines().count());
        fs::write(path, content)
    }
}
