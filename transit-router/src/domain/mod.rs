//! Domain types for the transit router.
//!
//! Connections, timestamps and route results. These are plain values:
//! the timetable and planner modules own all indexing and search state.

pub(crate) mod connection;
mod route;
mod time;

pub use connection::{Connection, Coordinates, EARTH_RADIUS_KM};
pub use route::{INFEASIBLE_COST, Itinerary, NO_ROUTE_COST, count_transfers};
pub use time::{TimeError, TransitTime};
