//! Capacity reconciliation.
//!
//! Applies the bandwidth of every mapping record of one virtual network to the
//! substrate residual capacity and the utilization ledger. Reserving subtracts
//! from the residual and adds to the ledger; releasing does the reverse.
//!
//! All records of both mapping files are validated before anything is
//! mutated, so a request either applies completely or not at all.

use std::collections::BTreeMap;
use std::path::Path;

use log::debug;

use crate::ledger::UtilizationLedger;
use crate::mapping::{load_mapping_file, MappingError, MappingKind, MappingRecord};
use crate::topology::{EdgeKey, PhysicalNetwork, VirtualNetwork};

/// Whether capacity is being taken or given back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Arrival of an accepted request
    Reserve,
    /// Departure of a previously accepted request
    Release,
}

impl Direction {
    /// Sign applied to the residual bandwidth. The ledger takes the opposite.
    pub fn residual_sign(&self) -> i64 {
        match self {
            Self::Reserve => -1,
            Self::Release => 1,
        }
    }
}

/// Errors raised while reconciling capacity
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error("{kind:?} mapping of virtual edge {virtual_edge} uses substrate edge {edge} which does not exist")]
    UnknownPhysicalEdge {
        kind: MappingKind,
        virtual_edge: EdgeKey,
        edge: EdgeKey,
    },

    #[error("Reserving {requested} on substrate edge {edge} would exceed its residual bandwidth {residual}")]
    CapacityExceeded {
        edge: EdgeKey,
        residual: i64,
        requested: i64,
    },

    #[error("Releasing {requested} on substrate edge {edge} exceeds the {reserved} reserved on it")]
    ReleaseExceedsReservation {
        edge: EdgeKey,
        reserved: i64,
        requested: i64,
    },

    #[error("Bandwidth mapped onto substrate edge {edge} overflows")]
    Overflow { edge: EdgeKey },
}

/// What a successful reconciliation changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub primary_records: usize,
    pub shadow_records: usize,
    /// Bandwidth moved between residual and ledger, summed over all records
    pub bandwidth: i64,
    /// Number of distinct substrate edges touched
    pub edges_touched: usize,
}

/// Apply already-parsed records as a single unit
pub fn apply_records(
    sn: &mut PhysicalNetwork,
    ledger: &mut UtilizationLedger,
    records: &[MappingRecord],
    direction: Direction,
) -> Result<ReconcileSummary, ReconcileError> {
    // Net bandwidth per substrate edge; adjustments commute per edge
    let mut deltas: BTreeMap<EdgeKey, i64> = BTreeMap::new();
    for record in records {
        if sn.edge(record.physical_edge).is_none() {
            return Err(ReconcileError::UnknownPhysicalEdge {
                kind: record.kind,
                virtual_edge: record.virtual_edge,
                edge: record.physical_edge,
            });
        }
        let delta = deltas.entry(record.physical_edge).or_insert(0);
        *delta = delta
            .checked_add(record.reserved_bandwidth)
            .ok_or(ReconcileError::Overflow {
                edge: record.physical_edge,
            })?;
    }

    for (&edge, &amount) in &deltas {
        let residual = sn.edge(edge).map(|attrs| attrs.bandwidth).unwrap_or(0);
        match direction {
            Direction::Reserve if residual < amount => {
                return Err(ReconcileError::CapacityExceeded {
                    edge,
                    residual,
                    requested: amount,
                });
            }
            Direction::Release if ledger.reserved(edge) < amount => {
                return Err(ReconcileError::ReleaseExceedsReservation {
                    edge,
                    reserved: ledger.reserved(edge),
                    requested: amount,
                });
            }
            _ => {}
        }
    }

    let sign = direction.residual_sign();
    for (&edge, &amount) in &deltas {
        if let Some(attrs) = sn.edge_mut(edge) {
            attrs.bandwidth += sign * amount;
        }
        ledger.adjust(edge, -sign * amount);
    }

    let summary = ReconcileSummary {
        primary_records: records.iter().filter(|r| r.kind == MappingKind::Primary).count(),
        shadow_records: records.iter().filter(|r| r.kind == MappingKind::Shadow).count(),
        bandwidth: deltas.values().fold(0i64, |total, amount| total.saturating_add(*amount)),
        edges_touched: deltas.len(),
    };
    debug!("{:?} applied: {:?}", direction, summary);
    Ok(summary)
}

/// Parse both mapping files of a request and apply them to the substrate.
///
/// Nothing is modified if either file fails to parse or the combined
/// adjustment would drive a residual or ledger entry negative.
pub fn apply(
    sn: &mut PhysicalNetwork,
    vn: &VirtualNetwork,
    ledger: &mut UtilizationLedger,
    primary_file: &Path,
    shadow_file: &Path,
    direction: Direction,
) -> Result<ReconcileSummary, ReconcileError> {
    let mut records = load_mapping_file(primary_file, MappingKind::Primary, vn)?;
    records.extend(load_mapping_file(shadow_file, MappingKind::Shadow, vn)?);
    apply_records(sn, ledger, &records, direction)
}
