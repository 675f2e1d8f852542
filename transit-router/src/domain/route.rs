//! Route results.
//!
//! An [`Itinerary`] is what every search hands back: the ordered
//! connections plus a numeric cost. Failure is data, not an error: an empty
//! route with a sentinel cost. Callers should check [`Itinerary::is_found`]
//! rather than comparing against the sentinel values.

use chrono::Duration;
use serde::Serialize;

use super::{Connection, TransitTime};

/// Cost reported when a search exhausts its state space.
pub const NO_ROUTE_COST: f64 = -1.0;

/// Cost reported for an infeasible waypoint ordering.
pub const INFEASIBLE_COST: f64 = f64::MAX;

/// Count line changes along a route.
///
/// The first connection never counts as a transfer; every later connection
/// whose line differs from the previous one does.
///
/// # Examples
///
/// ```
/// use transit_router::domain::count_transfers;
///
/// assert_eq!(count_transfers(&[]), 0);
/// ```
pub fn count_transfers(route: &[Connection]) -> usize {
    route
        .windows(2)
        .filter(|pair| pair[0].is_transfer_to(&pair[1]))
        .count()
}

/// A route and its cost under the criterion that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Itinerary {
    pub route: Vec<Connection>,
    pub cost: f64,
}

impl Itinerary {
    pub fn new(route: Vec<Connection>, cost: f64) -> Self {
        Self { route, cost }
    }

    /// The "no route found" result of the basic searches.
    pub fn not_found() -> Self {
        Self::new(Vec::new(), NO_ROUTE_COST)
    }

    /// The result for a waypoint ordering with an unreachable leg.
    pub fn infeasible() -> Self {
        Self::new(Vec::new(), INFEASIBLE_COST)
    }

    /// The degenerate result for a request whose start is its goal.
    pub fn already_there() -> Self {
        Self::new(Vec::new(), 0.0)
    }

    /// Returns true if this itinerary reaches the goal.
    ///
    /// An empty route is only a success when its cost is zero (start == goal).
    pub fn is_found(&self) -> bool {
        !self.route.is_empty() || self.cost == 0.0
    }

    /// Departure of the first connection.
    pub fn departure(&self) -> Option<TransitTime> {
        self.route.first().map(|c| c.departure)
    }

    /// Arrival of the last connection.
    pub fn arrival(&self) -> Option<TransitTime> {
        self.route.last().map(|c| c.arrival)
    }

    /// Time from the first departure to the final arrival.
    pub fn travel_time(&self) -> Option<Duration> {
        Some(self.arrival()?.signed_duration_since(self.departure()?))
    }

    /// Number of line changes on the route.
    pub fn transfers(&self) -> usize {
        count_transfers(&self.route)
    }
}
