//! Time-dependent route search.
//!
//! This module implements the searches that answer: "leaving this stop at
//! this time, how do I reach that stop?"
//!
//! - [`earliest_arrival`] / [`earliest_arrival_guided`]: Dijkstra on arrival
//!   time, optionally guided by a distance-based estimate.
//! - [`minimum_transfers`]: fewest line changes, earliest arrival on ties.
//! - [`WaypointSequencer`]: Tabu Search over the visiting order of required
//!   stops, stitching one of the above per leg.
//!
//! [`Planner`] validates requests and picks the right one.

mod config;
mod earliest;
mod frontier;
mod heuristic;
mod legs;
mod search;
mod tabu;
mod transfers;


pub use config::{
    ConfigError, MAX_CONFIG_MINS, MIN_CRUISING_SPEED_KMH, SearchConfig, SequencerVariant,
};
pub use earliest::{earliest_arrival, earliest_arrival_guided};
pub use heuristic::TravelTimeEstimate;
pub use legs::{ArrivalLegs, LegSearch, TransferLegs};
pub use search::{Criterion, Planner, SearchError, SearchRequest};
pub use tabu::{INFEASIBLE_ORDER, TabuMemory, WaypointSequencer, ordering_digest, swap_neighbors};
pub use transfers::minimum_transfers;
