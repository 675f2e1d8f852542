//! Earliest-arrival search.
//!
//! Dijkstra over (stop, arrival time) states keyed on arrival time, and an
//! A*-style variant that orders the frontier by arrival plus a
//! [`TravelTimeEstimate`]. A connection can be boarded from a state when it
//! departs at or after the state's arrival; there is no minimum change time.
//!
//! Both report cost as whole seconds from the requested start time to the
//! final arrival.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, NaiveDateTime};
use tracing::{debug, trace};

use crate::domain::{Connection, Itinerary, TransitTime};
use crate::timetable::AdjacencyIndex;

use super::frontier::Frontier;
use super::heuristic::TravelTimeEstimate;

struct TimeState {
    stop: Arc<str>,
    arrival: TransitTime,
    route: Vec<Connection>,
}

/// Plain earliest-arrival search.
///
/// Returns the route with the earliest final arrival at `goal`, or
/// [`Itinerary::not_found`] if the goal cannot be reached. A request whose
/// start is its goal succeeds immediately with an empty route and cost 0.
///
/// # Examples
///
/// ```
/// use transit_router::planner::earliest_arrival;
/// use transit_router::timetable::AdjacencyIndex;
/// use transit_router::domain::TransitTime;
/// use chrono::NaiveDate;
///
/// let date = NaiveDate::from_ymd_opt(2025, 3, 24).unwrap();
/// let at = TransitTime::parse_hms("08:00:00", date).unwrap();
/// let index = AdjacencyIndex::build(&[]);
///
/// let result = earliest_arrival(&index, "A", "B", at);
/// assert!(!result.is_found());
/// assert_eq!(result.cost, -1.0);
/// ```
pub fn earliest_arrival(
    index: &AdjacencyIndex,
    start: &str,
    goal: &str,
    depart_at: TransitTime,
) -> Itinerary {
    search(index, start, goal, depart_at, |_| Duration::zero())
}

/// Earliest-arrival search guided by a remaining-time estimate.
///
/// With a zero estimate this is identical to [`earliest_arrival`]. With a
/// non-zero penalty the estimate can overstate the remaining time, so the
/// returned route may arrive later than the plain search's.
pub fn earliest_arrival_guided(
    index: &AdjacencyIndex,
    estimate: &TravelTimeEstimate<'_>,
    start: &str,
    goal: &str,
    depart_at: TransitTime,
) -> Itinerary {
    search(index, start, goal, depart_at, |stop| estimate.estimate(stop))
}

fn search(
    index: &AdjacencyIndex,
    start: &str,
    goal: &str,
    depart_at: TransitTime,
    heuristic: impl Fn(&str) -> Duration,
) -> Itinerary {
    let start: Arc<str> = Arc::from(start);
    let mut best: HashMap<Arc<str>, TransitTime> = HashMap::new();
    best.insert(start.clone(), depart_at);

    let mut frontier = Frontier::new();
    frontier.push(
        (priority(depart_at, heuristic(&start)), depart_at),
        TimeState {
            stop: start,
            arrival: depart_at,
            route: Vec::new(),
        },
    );

    let mut expanded = 0usize;

    while let Some((_, state)) = frontier.pop() {
        if &*state.stop == goal {
            let cost = state.arrival.signed_duration_since(depart_at).num_seconds() as f64;
            debug!(
                goal,
                expanded,
                pushed = frontier.pushed(),
                legs = state.route.len(),
                cost,
                "Earliest-arrival search reached goal"
            );
            return Itinerary::new(state.route, cost);
        }

        // Stale entry: a better arrival at this stop was recorded after this was queued
        if best
            .get(&state.stop)
            .is_some_and(|&known| known < state.arrival)
        {
            continue;
        }

        expanded += 1;
        trace!(stop = %state.stop, arrival = %state.arrival, "Expanding");

        for connection in index.departures_from(&state.stop) {
            if !connection.boardable_at(state.arrival) {
                continue;
            }

            let improves = best
                .get(&connection.destination)
                .is_none_or(|&known| connection.arrival < known);
            if !improves {
                continue;
            }

            best.insert(connection.destination.clone(), connection.arrival);

            let mut route = state.route.clone();
            route.push(connection.clone());
            let key = (
                priority(connection.arrival, heuristic(&connection.destination)),
                connection.arrival,
            );
            frontier.push(
                key,
                TimeState {
                    stop: connection.destination.clone(),
                    arrival: connection.arrival,
                    route,
                },
            );
        }
    }

    debug!(goal, expanded, "Earliest-arrival search exhausted");
    Itinerary::not_found()
}

/// Frontier key `arrival + estimate`, saturating at the end of time.
fn priority(arrival: TransitTime, estimate: Duration) -> TransitTime {
    arrival
        .checked_add(estimate)
        .unwrap_or_else(|| TransitTime::from(NaiveDateTime::MAX))
}
