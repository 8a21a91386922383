//! Event schedule.
//!
//! Builds the arrival/departure events from a simulation plan and hands them
//! out in non-decreasing timestamp order. Events sharing a timestamp come out
//! in the order they were inserted: plan line order, and for a single line
//! its arrival before its departure.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

/// Simulated time
pub type Timestamp = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Arrival,
    Departure,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Arrival => write!(f, "arrival"),
            Self::Departure => write!(f, "departure"),
        }
    }
}

/// A single-shot simulation event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub timestamp: Timestamp,
    pub kind: EventKind,
    pub vn_id: String,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ts = {}, etype = {}, vn_id = {}", self.timestamp, self.kind, self.vn_id)
    }
}

/// One line of the simulation plan: `arrival_ts,departure_ts,vn_id`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanEntry {
    pub arrival: Timestamp,
    pub departure: Timestamp,
    pub vn_id: String,
}

/// Errors raised while reading a simulation plan
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("Failed to read simulation plan {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Plan line {line}: expected 3 fields, found {found}")]
    FieldCount { line: usize, found: usize },

    #[error("Plan line {line}: invalid {field} '{value}'")]
    InvalidTimestamp {
        line: usize,
        field: &'static str,
        value: String,
    },

    #[error("Plan line {line}: empty VN identifier")]
    EmptyVnId { line: usize },

    #[error("Plan line {line}: VN '{vn_id}' departs at {departure} before arriving at {arrival}")]
    DepartureBeforeArrival {
        line: usize,
        vn_id: String,
        arrival: Timestamp,
        departure: Timestamp,
    },
}

fn parse_timestamp(value: &str, field: &'static str, line: usize) -> Result<Timestamp, PlanError> {
    value
        .trim()
        .parse::<Timestamp>()
        .map_err(|_| PlanError::InvalidTimestamp {
            line,
            field,
            value: value.to_string(),
        })
}

/// Parse plan text. Any malformed line fails the whole plan.
pub fn parse_plan(content: &str) -> Result<Vec<PlanEntry>, PlanError> {
    let mut entries = Vec::new();

    for (index, raw_line) in content.lines().enumerate() {
        let line_no = index + 1;
        if raw_line.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = raw_line.split(',').collect();
        if fields.len() != 3 {
            return Err(PlanError::FieldCount {
                line: line_no,
                found: fields.len(),
            });
        }

        let arrival = parse_timestamp(fields[0], "arrival timestamp", line_no)?;
        let departure = parse_timestamp(fields[1], "departure timestamp", line_no)?;
        let vn_id = fields[2].trim().to_string();
        if vn_id.is_empty() {
            return Err(PlanError::EmptyVnId { line: line_no });
        }
        if departure < arrival {
            return Err(PlanError::DepartureBeforeArrival {
                line: line_no,
                vn_id,
                arrival,
                departure,
            });
        }

        entries.push(PlanEntry {
            arrival,
            departure,
            vn_id,
        });
    }

    Ok(entries)
}

/// Read and parse a simulation plan file
pub fn load_plan(path: &Path) -> Result<Vec<PlanEntry>, PlanError> {
    let content = fs::read_to_string(path).map_err(|source| PlanError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let entries = parse_plan(&content)?;
    info!("Loaded simulation plan {:?} with {} requests", path, entries.len());
    Ok(entries)
}

/// Heap entry ordered by timestamp, then insertion sequence
#[derive(Debug)]
struct Scheduled {
    timestamp: Timestamp,
    seq: u64,
    event: Event,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        self.timestamp
            .cmp(&other.timestamp)
            .then(self.seq.cmp(&other.seq))
    }
}

/// Time-ordered queue of arrival and departure events
#[derive(Debug, Default)]
pub struct EventSchedule {
    heap: BinaryHeap<Reverse<Scheduled>>,
    next_seq: u64,
}

impl EventSchedule {
    /// Build the schedule for a plan.
    ///
    /// Every entry yields an arrival. A departure is only scheduled when it
    /// falls within `max_simulation_time`; requests departing later keep their
    /// reservation for the rest of the run.
    pub fn build(plan: &[PlanEntry], max_simulation_time: Timestamp) -> Self {
        let mut schedule = Self::default();
        let mut dropped = 0usize;

        for entry in plan {
            schedule.push(Event {
                timestamp: entry.arrival,
                kind: EventKind::Arrival,
                vn_id: entry.vn_id.clone(),
            });
            if entry.departure <= max_simulation_time {
                schedule.push(Event {
                    timestamp: entry.departure,
                    kind: EventKind::Departure,
                    vn_id: entry.vn_id.clone(),
                });
            } else {
                dropped += 1;
            }
        }

        debug!(
            "Scheduled {} events, {} departures beyond horizon {}",
            schedule.len(),
            dropped,
            max_simulation_time
        );
        schedule
    }

    fn push(&mut self, event: Event) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(Scheduled {
            timestamp: event.timestamp,
            seq,
            event,
        }));
    }

    /// Remove and return the earliest event
    pub fn pop_next(&mut self) -> Option<Event> {
        self.heap.pop().map(|Reverse(scheduled)| scheduled.event)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(arrival: Timestamp, departure: Timestamp, vn_id: &str) -> PlanEntry {
        PlanEntry {
            arrival,
            departure,
            vn_id: vn_id.to_string(),
        }
    }

    fn drain(mut schedule: EventSchedule) -> Vec<(Timestamp, EventKind, String)> {
        let mut out = Vec::new();
        while let Some(event) = schedule.pop_next() {
            out.push((event.timestamp, event.kind, event.vn_id));
        }
        out
    }

    #[test]
    fn test_parse_plan() {
        let plan = parse_plan("0,50,vn0\n3,120,vn1\r\n\n").unwrap();
        assert_eq!(plan, vec![entry(0, 50, "vn0"), entry(3, 120, "vn1")]);
    }

    #[test]
    fn test_parse_plan_rejects_malformed_lines() {
        assert!(matches!(parse_plan("0,50"), Err(PlanError::FieldCount { line: 1, found: 2 })));
        assert!(matches!(
            parse_plan("0,50,vn0\nx,50,vn1"),
            Err(PlanError::InvalidTimestamp { line: 2, .. })
        ));
        assert!(matches!(parse_plan("0,50, "), Err(PlanError::EmptyVnId { line: 1 })));
        assert!(matches!(
            parse_plan("10,5,vn0"),
            Err(PlanError::DepartureBeforeArrival { line: 1, .. })
        ));
    }

    #[test]
    fn test_events_drain_in_timestamp_order() {
        let plan = vec![entry(5, 40, "vn1"), entry(0, 10, "vn0"), entry(20, 30, "vn2")];
        let events = drain(EventSchedule::build(&plan, 1000));

        let timestamps: Vec<Timestamp> = events.iter().map(|e| e.0).collect();
        assert_eq!(timestamps, vec![0, 5, 10, 20, 30, 40]);
        assert_eq!(events[2], (10, EventKind::Departure, "vn0".to_string()));
    }

    #[test]
    fn test_departure_beyond_horizon_is_not_scheduled() {
        let plan = vec![entry(0, 50, "vn0"), entry(10, 1001, "vn1"), entry(20, 1000, "vn2")];
        let schedule = EventSchedule::build(&plan, 1000);
        assert_eq!(schedule.len(), 5);

        let events = drain(schedule);
        assert!(!events
            .iter()
            .any(|(_, kind, id)| *kind == EventKind::Departure && id == "vn1"));
        assert!(events.contains(&(1000, EventKind::Departure, "vn2".to_string())));
    }

    #[test]
    fn test_equal_timestamps_keep_insertion_order() {
        let plan = vec![
            entry(10, 20, "vn0"),
            entry(10, 10, "vn1"),
            entry(20, 30, "vn2"),
            entry(10, 40, "vn3"),
        ];
        let events = drain(EventSchedule::build(&plan, 1000));

        assert_eq!(
            events,
            vec![
                (10, EventKind::Arrival, "vn0".to_string()),
                (10, EventKind::Arrival, "vn1".to_string()),
                (10, EventKind::Departure, "vn1".to_string()),
                (10, EventKind::Arrival, "vn3".to_string()),
                (20, EventKind::Departure, "vn0".to_string()),
                (20, EventKind::Arrival, "vn2".to_string()),
                (30, EventKind::Departure, "vn2".to_string()),
                (40, EventKind::Departure, "vn3".to_string()),
            ]
        );
    }

    #[test]
    fn test_drains_to_empty() {
        let mut schedule = EventSchedule::build(&[entry(7, 9, "vn0")], 5);
        assert_eq!(schedule.len(), 1);
        assert!(schedule.pop_next().is_some());
        assert!(schedule.is_empty());
        assert_eq!(schedule.pop_next(), None);
    }

    #[test]
    fn test_event_display() {
        let event = Event {
            timestamp: 3,
            kind: EventKind::Departure,
            vn_id: "vn7".to_string(),
        };
        assert_eq!(event.to_string(), "ts = 3, etype = departure, vn_id = vn7");
    }
}
