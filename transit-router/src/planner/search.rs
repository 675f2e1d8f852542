//! Request validation and search dispatch.
//!
//! A [`Planner`] owns the indexes built from one timetable snapshot and
//! routes each [`SearchRequest`] to the right algorithm:
//!
//! | required stops | criterion         | algorithm                                   |
//! |----------------|-------------------|---------------------------------------------|
//! | none           | earliest arrival  | Dijkstra, or guided if `config.guided`      |
//! | none           | fewest transfers  | minimum-transfer search                     |
//! | some           | either            | Tabu Search over the criterion's leg search |

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info};

use crate::domain::{Connection, Itinerary, TransitTime};
use crate::timetable::{AdjacencyIndex, StopDirectory};

use super::config::{SearchConfig, SequencerVariant};
use super::earliest::{earliest_arrival, earliest_arrival_guided};
use super::heuristic::TravelTimeEstimate;
use super::legs::{ArrivalLegs, LegSearch, TransferLegs};
use super::tabu::WaypointSequencer;
use super::transfers::minimum_transfers;

/// Error from route search.
///
/// Only malformed requests fail; an unreachable goal is a normal
/// [`Itinerary`] carrying a sentinel cost.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    /// A stop named in the request appears nowhere in the timetable
    #[error("unknown stop: {0}")]
    UnknownStop(String),

    /// Invalid search request
    #[error("invalid search request: {0}")]
    InvalidRequest(String),
}

/// What a search minimises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Criterion {
    /// Earliest arrival; cost is elapsed seconds from the start time.
    #[default]
    EarliestArrival,
    /// Fewest line changes, then earliest arrival; cost is the change count.
    FewestTransfers,
}

/// Request for route search.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub start: String,
    pub goal: String,
    /// Stops the route must visit, in any order.
    pub via: Vec<String>,
    pub depart_at: TransitTime,
    pub criterion: Criterion,
}

impl SearchRequest {
    /// Create a request with no required stops.
    pub fn new(
        start: impl Into<String>,
        goal: impl Into<String>,
        depart_at: TransitTime,
        criterion: Criterion,
    ) -> Self {
        Self {
            start: start.into(),
            goal: goal.into(),
            via: Vec::new(),
            depart_at,
            criterion,
        }
    }

    /// Add required stops.
    pub fn with_via<I, S>(mut self, via: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.via.extend(via.into_iter().map(Into::into));
        self
    }

    /// Required stops with duplicates removed, first occurrence kept.
    fn distinct_via(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.via
            .iter()
            .map(String::as_str)
            .filter(|stop| seen.insert(*stop))
            .collect()
    }
}

/// Route planner over one timetable snapshot.
pub struct Planner<'a> {
    index: AdjacencyIndex,
    directory: StopDirectory,
    config: &'a SearchConfig,
}

impl<'a> Planner<'a> {
    /// Build the indexes for `connections`.
    pub fn new(connections: &[Connection], config: &'a SearchConfig) -> Self {
        let index = AdjacencyIndex::build(connections);
        let directory = StopDirectory::build(connections);
        debug!(
            stops = directory.len(),
            connections = index.connection_count(),
            "Built planner indexes"
        );
        Self {
            index,
            directory,
            config,
        }
    }

    pub fn index(&self) -> &AdjacencyIndex {
        &self.index
    }

    pub fn directory(&self) -> &StopDirectory {
        &self.directory
    }

    /// Check that every stop named in `request` exists in the timetable.
    pub fn validate(&self, request: &SearchRequest) -> Result<(), SearchError> {
        for stop in [&request.start, &request.goal]
            .into_iter()
            .chain(&request.via)
        {
            if stop.trim().is_empty() {
                return Err(SearchError::InvalidRequest(
                    "stop names must not be empty".to_string(),
                ));
            }
            if !self.directory.contains(stop) {
                return Err(SearchError::UnknownStop(stop.clone()));
            }
        }
        Ok(())
    }

    /// Find a route for `request`.
    pub fn plan(&self, request: &SearchRequest) -> Result<Itinerary, SearchError> {
        self.validate(request)?;

        let via = request.distinct_via();
        info!(
            start = %request.start,
            goal = %request.goal,
            via = via.len(),
            criterion = ?request.criterion,
            depart_at = %request.depart_at,
            "Planning route"
        );

        let itinerary = if via.is_empty() {
            self.direct(request)
        } else {
            match request.criterion {
                Criterion::FewestTransfers => {
                    let legs = TransferLegs::new(&self.index, self.config.wait_quantum());
                    self.sequence(&legs, request, &via)
                }
                Criterion::EarliestArrival if self.config.guided => {
                    let legs = ArrivalLegs::guided(&self.index, &self.directory, self.config);
                    self.sequence(&legs, request, &via)
                }
                Criterion::EarliestArrival => {
                    let legs = ArrivalLegs::plain(&self.index);
                    self.sequence(&legs, request, &via)
                }
            }
        };

        info!(
            found = itinerary.is_found(),
            legs = itinerary.route.len(),
            cost = itinerary.cost,
            "Search complete"
        );
        Ok(itinerary)
    }

    fn direct(&self, request: &SearchRequest) -> Itinerary {
        let (start, goal, at) = (&*request.start, &*request.goal, request.depart_at);
        match request.criterion {
            Criterion::EarliestArrival if self.config.guided => {
                let estimate = TravelTimeEstimate::new(&self.directory, goal, self.config);
                earliest_arrival_guided(&self.index, &estimate, start, goal, at)
            }
            Criterion::EarliestArrival => earliest_arrival(&self.index, start, goal, at),
            Criterion::FewestTransfers => {
                minimum_transfers(&self.index, start, goal, at, self.config.wait_quantum())
            }
        }
    }

    fn sequence<L: LegSearch>(
        &self,
        legs: &L,
        request: &SearchRequest,
        via: &[&str],
    ) -> Itinerary {
        let mut sequencer =
            WaypointSequencer::new(legs, &request.start, &request.goal, request.depart_at);

        match self.config.sequencer {
            SequencerVariant::Aspiration => sequencer.run(via, self.config.max_iterations),
            SequencerVariant::Knox => {
                let mut rng = match self.config.seed {
                    Some(seed) => StdRng::seed_from_u64(seed),
                    None => StdRng::from_entropy(),
                };
                sequencer.run_knox(via, self.config.step_limit, self.config.op_limit, &mut rng)
            }
        }
    }
}
