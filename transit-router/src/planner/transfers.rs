//! Minimum-transfer search.
//!
//! Labels are `(transfers, arrival)` pairs compared lexicographically: fewer
//! line changes always wins, earlier arrival breaks ties. Each stop keeps its
//! best label; a popped state whose label is strictly worse than the stop's
//! best is dropped (lazy deletion).
//!
//! Besides boarding, a state may "wait": stay at the stop with the clock
//! advanced by the wait quantum. A wait is generated only while some
//! departure from the stop is still boardable after it, and it goes through
//! the same dominance check as any other label.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, trace};

use crate::domain::{Connection, Itinerary, TransitTime};
use crate::timetable::AdjacencyIndex;

use super::frontier::Frontier;

type Label = (usize, TransitTime);

struct TransferState {
    stop: Arc<str>,
    arrival: TransitTime,
    transfers: usize,
    route: Vec<Connection>,
}

impl TransferState {
    fn label(&self) -> Label {
        (self.transfers, self.arrival)
    }

    /// Transfers after boarding `next` from this state.
    fn transfers_after(&self, next: &Connection) -> usize {
        match self.route.last() {
            Some(last) if last.is_transfer_to(next) => self.transfers + 1,
            _ => self.transfers,
        }
    }
}

/// Find the route to `goal` with the fewest line changes, then the earliest
/// arrival among those.
///
/// The cost is the transfer count. Returns [`Itinerary::not_found`] when the
/// goal is unreachable; a zero `wait_quantum` disables waiting.
pub fn minimum_transfers(
    index: &AdjacencyIndex,
    start: &str,
    goal: &str,
    depart_at: TransitTime,
    wait_quantum: Duration,
) -> Itinerary {
    let start: Arc<str> = Arc::from(start);
    let mut best: HashMap<Arc<str>, Label> = HashMap::new();
    best.insert(start.clone(), (0, depart_at));

    let mut frontier = Frontier::new();
    frontier.push(
        (0, depart_at),
        TransferState {
            stop: start,
            arrival: depart_at,
            transfers: 0,
            route: Vec::new(),
        },
    );

    let mut expanded = 0usize;

    while let Some((_, state)) = frontier.pop() {
        if &*state.stop == goal {
            debug!(
                goal,
                expanded,
                pushed = frontier.pushed(),
                transfers = state.transfers,
                legs = state.route.len(),
                "Minimum-transfer search reached goal"
            );
            return Itinerary::new(state.route, state.transfers as f64);
        }

        if best
            .get(&state.stop)
            .is_some_and(|&known| known < state.label())
        {
            continue;
        }

        expanded += 1;
        trace!(
            stop = %state.stop,
            arrival = %state.arrival,
            transfers = state.transfers,
            "Expanding"
        );

        let departures = index.departures_from(&state.stop);

        for connection in departures {
            if !connection.boardable_at(state.arrival) {
                continue;
            }

            let label = (state.transfers_after(connection), connection.arrival);
            if !improve(&mut best, &connection.destination, label) {
                continue;
            }

            let mut route = state.route.clone();
            route.push(connection.clone());
            frontier.push(
                label,
                TransferState {
                    stop: connection.destination.clone(),
                    arrival: connection.arrival,
                    transfers: label.0,
                    route,
                },
            );
        }

        if wait_quantum > Duration::zero() {
            let Some(waited) = state.arrival.checked_add(wait_quantum) else {
                continue;
            };
            let worth_waiting = departures.iter().any(|c| c.boardable_at(waited));
            let label = (state.transfers, waited);
            if worth_waiting && improve(&mut best, &state.stop, label) {
                frontier.push(
                    label,
                    TransferState {
                        stop: state.stop.clone(),
                        arrival: waited,
                        transfers: state.transfers,
                        route: state.route.clone(),
                    },
                );
            }
        }
    }

    debug!(goal, expanded, "Minimum-transfer search exhausted");
    Itinerary::not_found()
}

/// Record `label` for `stop` if it is strictly better than what is known.
fn improve(best: &mut HashMap<Arc<str>, Label>, stop: &Arc<str>, label: Label) -> bool {
    match best.get(stop) {
        Some(&known) if known <= label => false,
        _ => {
            best.insert(stop.clone(), label);
            true
        }
    }
}
