//! Adjacency index over the connection list.
//!
//! Every search expands a stop by looking at the connections that leave it.
//! The index answers that in O(1) per stop and is built once per request,
//! then shared read-only by all searches run against the same snapshot.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::Connection;

/// Map from stop name to the connections departing it, in input order.
#[derive(Debug, Default)]
pub struct AdjacencyIndex {
    outgoing: HashMap<Arc<str>, Vec<Connection>>,
}

impl AdjacencyIndex {
    /// Build the index from the full connection list.
    ///
    /// Construction cannot fail. Stops that never appear as an origin are
    /// simply absent.
    pub fn build(connections: &[Connection]) -> Self {
        let mut outgoing: HashMap<Arc<str>, Vec<Connection>> = HashMap::new();

        for connection in connections {
            outgoing
                .entry(connection.origin.clone())
                .or_default()
                .push(connection.clone());
        }

        Self { outgoing }
    }

    /// Connections departing `stop`; empty for stops with no outgoing edges.
    pub fn departures_from(&self, stop: &str) -> &[Connection] {
        self.outgoing
            .get(stop)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Returns true if any connection departs `stop`.
    pub fn has_departures(&self, stop: &str) -> bool {
        self.outgoing.contains_key(stop)
    }

    /// Number of stops with at least one departure.
    pub fn stop_count(&self) -> usize {
        self.outgoing.len()
    }

    /// Total number of indexed connections.
    pub fn connection_count(&self) -> usize {
        self.outgoing.values().map(|v| v.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::connection::fixtures::*;

    #[test]
    fn empty_index() {
        let index = AdjacencyIndex::build(&[]);

        assert_eq!(index.stop_count(), 0);
        assert_eq!(index.connection_count(), 0);
        assert!(index.departures_from("A").is_empty());
    }

    #[test]
    fn groups_by_origin_in_input_order() {
        let connections = vec![
            conn(1, "1", "A", "08:00:00", "B", "08:10:00"),
            conn(2, "2", "B", "08:20:00", "C", "08:30:00"),
            conn(3, "3", "A", "07:00:00", "C", "07:30:00"),
        ];

        let index = AdjacencyIndex::build(&connections);

        assert_eq!(index.stop_count(), 2);
        assert_eq!(index.connection_count(), 3);

        let from_a: Vec<u32> = index.departures_from("A").iter().map(|c| c.id).collect();
        assert_eq!(from_a, vec![1, 3]);
        assert_eq!(index.departures_from("B").len(), 1);
    }

    #[test]
    fn destination_only_stop_has_no_edges() {
        let connections = vec![conn(1, "1", "A", "08:00:00", "B", "08:10:00")];
        let index = AdjacencyIndex::build(&connections);

        // B is known as a destination but nothing leaves it
        assert!(!index.has_departures("B"));
        assert!(index.departures_from("B").is_empty());
        assert!(index.has_departures("A"));
    }
}
