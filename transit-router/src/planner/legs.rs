//! Point-to-point searches used as the waypoint sequencer's cost oracle.

use chrono::Duration;

use crate::domain::{Connection, Itinerary, TransitTime, count_transfers};
use crate::timetable::{AdjacencyIndex, StopDirectory};

use super::config::SearchConfig;
use super::earliest::{earliest_arrival, earliest_arrival_guided};
use super::heuristic::TravelTimeEstimate;
use super::transfers::minimum_transfers;

/// One segment search plus the cost measure for stitched routes.
///
/// This abstraction allows the sequencer to be tested with mock data.
pub trait LegSearch {
    /// Search a single segment, starting no earlier than `depart_at`.
    fn search_leg(&self, from: &str, to: &str, depart_at: TransitTime) -> Itinerary;

    /// Cost of a full concatenated route that started at `depart_at`.
    fn route_cost(&self, route: &[Connection], depart_at: TransitTime) -> u64;
}

/// Segments by minimum-transfer search; routes cost their line changes.
#[derive(Debug, Clone, Copy)]
pub struct TransferLegs<'a> {
    index: &'a AdjacencyIndex,
    wait_quantum: Duration,
}

impl<'a> TransferLegs<'a> {
    pub fn new(index: &'a AdjacencyIndex, wait_quantum: Duration) -> Self {
        Self {
            index,
            wait_quantum,
        }
    }
}

impl LegSearch for TransferLegs<'_> {
    fn search_leg(&self, from: &str, to: &str, depart_at: TransitTime) -> Itinerary {
        minimum_transfers(self.index, from, to, depart_at, self.wait_quantum)
    }

    fn route_cost(&self, route: &[Connection], _depart_at: TransitTime) -> u64 {
        count_transfers(route) as u64
    }
}

/// Segments by earliest-arrival search; routes cost their elapsed seconds.
#[derive(Debug, Clone, Copy)]
pub struct ArrivalLegs<'a> {
    index: &'a AdjacencyIndex,
    guide: Option<(&'a StopDirectory, &'a SearchConfig)>,
}

impl<'a> ArrivalLegs<'a> {
    pub fn plain(index: &'a AdjacencyIndex) -> Self {
        Self { index, guide: None }
    }

    pub fn guided(
        index: &'a AdjacencyIndex,
        directory: &'a StopDirectory,
        config: &'a SearchConfig,
    ) -> Self {
        Self {
            index,
            guide: Some((directory, config)),
        }
    }
}

impl LegSearch for ArrivalLegs<'_> {
    fn search_leg(&self, from: &str, to: &str, depart_at: TransitTime) -> Itinerary {
        match self.guide {
            Some((directory, config)) => {
                let estimate = TravelTimeEstimate::new(directory, to, config);
                earliest_arrival_guided(self.index, &estimate, from, to, depart_at)
            }
            None => earliest_arrival(self.index, from, to, depart_at),
        }
    }

    fn route_cost(&self, route: &[Connection], depart_at: TransitTime) -> u64 {
        route
            .last()
            .map(|c| c.arrival.signed_duration_since(depart_at).num_seconds().max(0) as u64)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::connection::fixtures::*;

    fn network() -> Vec<Connection> {
        vec![
            conn(1, "1", "A", "08:00:00", "B", "08:10:00"),
            conn(2, "2", "B", "08:20:00", "C", "08:30:00"),
        ]
    }

    #[test]
    fn transfer_legs_cost_line_changes() {
        let index = AdjacencyIndex::build(&network());
        let legs = TransferLegs::new(&index, Duration::minutes(15));

        let leg = legs.search_leg("A", "C", time("08:00:00"));

        assert_eq!(leg.cost, 1.0);
        assert_eq!(legs.route_cost(&leg.route, time("08:00:00")), 1);
    }

    #[test]
    fn arrival_legs_cost_elapsed_seconds() {
        let connections = network();
        let index = AdjacencyIndex::build(&connections);
        let directory = StopDirectory::build(&connections);
        let config = SearchConfig::default();

        for legs in [
            ArrivalLegs::plain(&index),
            ArrivalLegs::guided(&index, &directory, &config),
        ] {
            let leg = legs.search_leg("A", "C", time("07:50:00"));

            assert_eq!(leg.route.len(), 2);
            assert_eq!(legs.route_cost(&leg.route, time("07:50:00")), 40 * 60);
        }
    }

    #[test]
    fn empty_route_costs_nothing() {
        let index = AdjacencyIndex::build(&[]);

        assert_eq!(ArrivalLegs::plain(&index).route_cost(&[], time("08:00:00")), 0);
        assert_eq!(
            TransferLegs::new(&index, Duration::zero()).route_cost(&[], time("08:00:00")),
            0
        );
    }
}
