//! Per-stop facts derived from the connection list.
//!
//! Stops have no entity of their own in the timetable: a stop is a name that
//! appears as an origin or destination. The directory records where each
//! stop is (from the first connection that touches it) and which lines
//! serve it, for request validation and the guided search heuristic.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::domain::{Connection, Coordinates};

#[derive(Debug)]
struct StopInfo {
    coords: Coordinates,
    lines: HashSet<Arc<str>>,
}

/// Lookup of every stop named in the timetable.
#[derive(Debug, Default)]
pub struct StopDirectory {
    stops: HashMap<Arc<str>, StopInfo>,
}

impl StopDirectory {
    pub fn build(connections: &[Connection]) -> Self {
        let mut stops: HashMap<Arc<str>, StopInfo> = HashMap::new();

        for connection in connections {
            for (name, coords) in [
                (&connection.origin, connection.origin_coords),
                (&connection.destination, connection.destination_coords),
            ] {
                stops
                    .entry(name.clone())
                    .or_insert_with(|| StopInfo {
                        coords,
                        lines: HashSet::new(),
                    })
                    .lines
                    .insert(connection.line.clone());
            }
        }

        Self { stops }
    }

    /// Returns true if `stop` appears anywhere in the timetable.
    pub fn contains(&self, stop: &str) -> bool {
        self.stops.contains_key(stop)
    }

    /// Coordinates of the first connection that touched `stop`.
    pub fn coordinates(&self, stop: &str) -> Option<Coordinates> {
        self.stops.get(stop).map(|s| s.coords)
    }

    /// Returns true if at least one line calls at both stops.
    pub fn share_line(&self, a: &str, b: &str) -> bool {
        match (self.stops.get(a), self.stops.get(b)) {
            (Some(a), Some(b)) => !a.lines.is_disjoint(&b.lines),
            _ => false,
        }
    }

    /// Number of distinct stops.
    pub fn len(&self) -> usize {
        self.stops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }
}
