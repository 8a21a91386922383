//! Mutable run state owned by the simulation driver.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::ledger::UtilizationLedger;
use crate::reconcile::{self, Direction, ReconcileError, ReconcileSummary};
use crate::topology::{EdgeKey, PhysicalNetwork, VirtualNetwork};

/// Errors raised by the conservation audit
#[derive(Debug, thiserror::Error)]
pub enum InvariantError {
    #[error("Edge {edge}: reserved {reserved} + residual {residual} != original {original}")]
    ConservationViolated {
        edge: EdgeKey,
        original: i64,
        reserved: i64,
        residual: i64,
    },

    #[error("Edge {edge}: negative residual bandwidth {residual}")]
    NegativeResidual { edge: EdgeKey, residual: i64 },

    #[error("Edge {edge} is missing from the substrate")]
    MissingEdge { edge: EdgeKey },
}

/// Substrate, ledger and counters for one run.
///
/// Every capacity change goes through [`SimulationState::reserve`] or
/// [`SimulationState::release`], which keep the substrate residuals and the
/// ledger in step.
#[derive(Debug, Clone)]
pub struct SimulationState {
    sn: PhysicalNetwork,
    ledger: UtilizationLedger,
    original: BTreeMap<EdgeKey, i64>,
    /// Admitted requests still holding capacity, by identifier
    admitted: HashMap<String, u32>,
    total_vns: u64,
    accepted_vns: u64,
}

impl SimulationState {
    /// Start a run on `sn`. Its current bandwidth is taken as original capacity.
    pub fn new(sn: PhysicalNetwork) -> Self {
        let ledger = UtilizationLedger::for_network(&sn);
        let original = sn.edges().map(|(key, attrs)| (key, attrs.bandwidth)).collect();
        Self {
            sn,
            ledger,
            original,
            admitted: HashMap::new(),
            total_vns: 0,
            accepted_vns: 0,
        }
    }

    pub fn sn(&self) -> &PhysicalNetwork {
        &self.sn
    }

    pub fn ledger(&self) -> &UtilizationLedger {
        &self.ledger
    }

    /// Capacity of `key` when the run started
    pub fn original_bandwidth(&self, key: EdgeKey) -> Option<i64> {
        self.original.get(&key).copied()
    }

    pub fn total_vns(&self) -> u64 {
        self.total_vns
    }

    pub fn accepted_vns(&self) -> u64 {
        self.accepted_vns
    }

    pub fn rejected_vns(&self) -> u64 {
        self.total_vns - self.accepted_vns
    }

    /// Whether `vn_id` currently holds a reservation
    pub fn is_admitted(&self, vn_id: &str) -> bool {
        self.admitted.get(vn_id).is_some_and(|count| *count > 0)
    }

    /// Count an arrival, whatever its outcome
    pub fn record_arrival(&mut self) {
        self.total_vns += 1;
    }

    /// Reserve the mappings of an accepted arrival and count it
    pub fn reserve(
        &mut self,
        vn_id: &str,
        vn: &VirtualNetwork,
        primary_file: &Path,
        shadow_file: &Path,
    ) -> Result<ReconcileSummary, ReconcileError> {
        let summary = reconcile::apply(
            &mut self.sn,
            vn,
            &mut self.ledger,
            primary_file,
            shadow_file,
            Direction::Reserve,
        )?;
        *self.admitted.entry(vn_id.to_string()).or_insert(0) += 1;
        self.accepted_vns += 1;
        Ok(summary)
    }

    /// Release the mappings of a departing request
    pub fn release(
        &mut self,
        vn_id: &str,
        vn: &VirtualNetwork,
        primary_file: &Path,
        shadow_file: &Path,
    ) -> Result<ReconcileSummary, ReconcileError> {
        let summary = reconcile::apply(
            &mut self.sn,
            vn,
            &mut self.ledger,
            primary_file,
            shadow_file,
            Direction::Release,
        )?;
        if let Some(count) = self.admitted.get_mut(vn_id) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.admitted.remove(vn_id);
            }
        }
        Ok(summary)
    }

    /// Verify `reserved + residual == original` and `residual >= 0` on every edge
    pub fn check_conservation(&self) -> Result<(), InvariantError> {
        for (&edge, &original) in &self.original {
            let residual = self
                .sn
                .edge(edge)
                .map(|attrs| attrs.bandwidth)
                .ok_or(InvariantError::MissingEdge { edge })?;
            if residual < 0 {
                return Err(InvariantError::NegativeResidual { edge, residual });
            }
            let reserved = self.ledger.reserved(edge);
            if reserved + residual != original {
                return Err(InvariantError::ConservationViolated {
                    edge,
                    original,
                    reserved,
                    residual,
                });
            }
        }
        Ok(())
    }
}
