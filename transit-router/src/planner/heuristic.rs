//! Remaining-time estimate for the guided earliest-arrival search.
//!
//! The estimate is straight-line distance at a cruising speed plus a flat
//! penalty for stops that share no line with the goal. The penalty makes the
//! estimate inadmissible, so the guided search trades optimality for fewer
//! expansions.

use chrono::Duration;

use crate::domain::Coordinates;
use crate::timetable::StopDirectory;

use super::config::{MIN_CRUISING_SPEED_KMH, SearchConfig};

/// Estimates time-to-goal for a fixed goal stop.
#[derive(Debug)]
pub struct TravelTimeEstimate<'a> {
    directory: &'a StopDirectory,
    goal: &'a str,
    goal_coords: Option<Coordinates>,
    speed_kmh: f64,
    transfer_penalty: Duration,
}

impl<'a> TravelTimeEstimate<'a> {
    pub fn new(directory: &'a StopDirectory, goal: &'a str, config: &SearchConfig) -> Self {
        Self {
            directory,
            goal,
            goal_coords: directory.coordinates(goal),
            speed_kmh: config.cruising_speed_kmh.max(MIN_CRUISING_SPEED_KMH),
            transfer_penalty: config.transfer_penalty(),
        }
    }

    /// Estimated time from `stop` to the goal. Zero at the goal itself.
    ///
    /// Stops without known coordinates contribute no distance term.
    pub fn estimate(&self, stop: &str) -> Duration {
        if stop == self.goal {
            return Duration::zero();
        }

        let travel = match (self.directory.coordinates(stop), self.goal_coords) {
            (Some(here), Some(goal)) => {
                let hours = here.haversine_km(&goal) / self.speed_kmh;
                Duration::seconds((hours * 3600.0) as i64)
            }
            _ => Duration::zero(),
        };

        if self.directory.share_line(stop, self.goal) {
            travel
        } else {
            travel + self.transfer_penalty
        }
    }
}
