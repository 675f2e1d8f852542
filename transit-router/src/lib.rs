//! Time-dependent transit route planner.
//!
//! Loads a timetable of stop-to-stop connections and answers: "leaving here
//! at this time, what is the fastest route, or the one with the fewest line
//! changes, to there, optionally passing through these stops?"

pub mod domain;
pub mod format;
pub mod planner;
pub mod timetable;
