//! Search configuration for the route planner.

use std::path::{Path, PathBuf};

use chrono::Duration;
use serde::Deserialize;

/// Error loading or validating a [`SearchConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The config file is not valid JSON for this schema
    #[error("invalid config {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// A value is outside its allowed range
    #[error("invalid config value for {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Which Tabu Search form orders the required stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SequencerVariant {
    /// Single loop; a neighbour beating the global best is taken at once.
    #[default]
    Aspiration,
    /// Randomised start, outer step loop and inner strict-improvement loop.
    Knox,
}

/// Configuration parameters for route search.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    /// Clock advance for the transfer search's wait expansion (minutes).
    /// Zero disables waiting.
    pub wait_quantum_mins: i64,

    /// Assumed average vehicle speed for the guided heuristic (km/h).
    pub cruising_speed_kmh: f64,

    /// Added to the guided heuristic when a stop shares no line with the
    /// goal (minutes). Zero disables the penalty.
    pub transfer_penalty_mins: i64,

    /// Use the heuristic-guided earliest-arrival search instead of plain Dijkstra.
    pub guided: bool,

    /// Tabu Search form used when the request has required stops.
    pub sequencer: SequencerVariant,

    /// Iteration budget of the aspiration variant.
    pub max_iterations: usize,

    /// Outer step budget of the Knox variant.
    pub step_limit: usize,

    /// Inner per-step move budget of the Knox variant.
    pub op_limit: usize,

    /// Seed for the Knox initial shuffle. `None` seeds from the OS.
    pub seed: Option<u64>,

    /// How far before "now" a request without an explicit start time begins (minutes).
    pub lookback_mins: i64,
}

impl SearchConfig {
    /// Load a configuration from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every value is in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_minutes("wait_quantum_mins", self.wait_quantum_mins)?;
        if !(self.cruising_speed_kmh.is_finite()
            && self.cruising_speed_kmh >= MIN_CRUISING_SPEED_KMH)
        {
            return Err(ConfigError::Invalid {
                field: "cruising_speed_kmh",
                reason: "must be a finite number of at least 1 km/h",
            });
        }
        check_minutes("transfer_penalty_mins", self.transfer_penalty_mins)?;
        check_minutes("lookback_mins", self.lookback_mins)?;
        Ok(())
    }

    /// Returns the wait quantum as a Duration.
    pub fn wait_quantum(&self) -> Duration {
        bounded_minutes(self.wait_quantum_mins)
    }

    /// Returns the heuristic transfer penalty as a Duration.
    pub fn transfer_penalty(&self) -> Duration {
        bounded_minutes(self.transfer_penalty_mins)
    }

    /// Returns the look-back offset as a Duration.
    pub fn lookback(&self) -> Duration {
        bounded_minutes(self.lookback_mins)
    }
}

/// Upper bound for every `*_mins` setting: two days.
pub const MAX_CONFIG_MINS: i64 = 48 * 60;

/// Slowest cruising speed the guided heuristic accepts (km/h).
pub const MIN_CRUISING_SPEED_KMH: f64 = 1.0;

fn check_minutes(field: &'static str, value: i64) -> Result<(), ConfigError> {
    if value < 0 {
        return Err(ConfigError::Invalid {
            field,
            reason: "must not be negative",
        });
    }
    if value > MAX_CONFIG_MINS {
        return Err(ConfigError::Invalid {
            field,
            reason: "must be at most 2880 minutes (48 hours)",
        });
    }
    Ok(())
}

/// Unvalidated configs still reach the planner, so clamp instead of panicking.
fn bounded_minutes(value: i64) -> Duration {
    Duration::minutes(value.clamp(0, MAX_CONFIG_MINS))
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            wait_quantum_mins: 15,
            cruising_speed_kmh: 30.0,
            transfer_penalty_mins: 5,
            guided: false,
            sequencer: SequencerVariant::Aspiration,
            max_iterations: 100,
            step_limit: 10,
            op_limit: 10,
            seed: None,
            lookback_mins: 0,
        }
    }
}
