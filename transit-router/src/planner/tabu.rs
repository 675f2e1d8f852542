//! Waypoint sequencing by Tabu Search.
//!
//! Given a set of stops the route must visit, find a visiting order that
//! minimises the cost of the stitched route start → order… → goal. Each
//! ordering is evaluated by chaining [`LegSearch`] calls, each leg starting
//! at the previous leg's arrival. One failed leg makes the whole ordering
//! infeasible.
//!
//! The neighbourhood of an ordering is every ordering reachable by swapping
//! two positions. Recently visited orderings are kept in a bounded
//! [`TabuMemory`] and skipped, unless a neighbour beats the best cost seen so
//! far (aspiration), in which case it is taken immediately.
//!
//! Two drivers share this machinery:
//!
//! - [`WaypointSequencer::run`] starts from the given order and moves to the
//!   best admissible neighbour each iteration, even when that is worse.
//! - [`WaypointSequencer::run_knox`] starts from a shuffled order and, in
//!   each outer step, makes strictly improving moves until none remain or
//!   the per-step budget runs out.

use std::collections::{HashMap, HashSet, VecDeque};
use std::hash::{Hash, Hasher};

use rand::Rng;
use rand::seq::SliceRandom;
use rustc_hash::FxHasher;
use tracing::{debug, trace};

use crate::domain::{Connection, Itinerary, TransitTime};

use super::legs::LegSearch;

/// Ordering cost for an ordering with an unreachable leg.
pub const INFEASIBLE_ORDER: u64 = u64::MAX;

/// Fixed-capacity FIFO of ordering digests with O(1) membership.
///
/// When full, recording a new digest evicts the oldest one. Recording a
/// digest that is already present is a no-op.
#[derive(Debug, Clone)]
pub struct TabuMemory {
    queue: VecDeque<u64>,
    members: HashSet<u64>,
    capacity: usize,
}

impl TabuMemory {
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: VecDeque::with_capacity(capacity),
            members: HashSet::with_capacity(capacity),
            capacity,
        }
    }

    pub fn contains(&self, digest: u64) -> bool {
        self.members.contains(&digest)
    }

    pub fn record(&mut self, digest: u64) {
        if self.capacity == 0 || self.members.contains(&digest) {
            return;
        }
        if self.queue.len() == self.capacity {
            if let Some(oldest) = self.queue.pop_front() {
                self.members.remove(&oldest);
            }
        }
        self.queue.push_back(digest);
        self.members.insert(digest);
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Order-sensitive digest of a visiting order.
pub fn ordering_digest(order: &[&str]) -> u64 {
    let mut hasher = FxHasher::default();
    order.hash(&mut hasher);
    hasher.finish()
}

/// Every ordering obtained by swapping two positions of `order`.
///
/// Produces `n * (n - 1) / 2` neighbours, in `(i, j)` order with `i < j`.
pub fn swap_neighbors<'a>(order: &[&'a str]) -> Vec<Vec<&'a str>> {
    let n = order.len();
    let mut neighbors = Vec::with_capacity(n * n.saturating_sub(1) / 2);
    for i in 0..n {
        for j in (i + 1)..n {
            let mut neighbor = order.to_vec();
            neighbor.swap(i, j);
            neighbors.push(neighbor);
        }
    }
    neighbors
}

/// The neighbour chosen by one scan of the neighbourhood.
struct Move<'a> {
    order: Vec<&'a str>,
    cost: u64,
}

/// Orders required stops between a fixed start and goal.
///
/// Ordering costs are memoised for the lifetime of the sequencer, so one
/// sequencer should serve a single request.
pub struct WaypointSequencer<'a, L: LegSearch> {
    legs: &'a L,
    start: &'a str,
    goal: &'a str,
    depart_at: TransitTime,
    costs: HashMap<Vec<&'a str>, u64>,
    peak_tabu_len: usize,
}

impl<'a, L: LegSearch> WaypointSequencer<'a, L> {
    pub fn new(legs: &'a L, start: &'a str, goal: &'a str, depart_at: TransitTime) -> Self {
        Self {
            legs,
            start,
            goal,
            depart_at,
            costs: HashMap::new(),
            peak_tabu_len: 0,
        }
    }

    /// Stitch the legs start → `order`… → goal.
    ///
    /// Returns `None` if any leg is unreachable.
    pub fn construct_route(&self, order: &[&str]) -> Option<Vec<Connection>> {
        let mut route = Vec::new();
        let mut at = self.start;
        let mut time = self.depart_at;

        for &stop in order.iter().chain(std::iter::once(&self.goal)) {
            let leg = self.legs.search_leg(at, stop, time);
            if !leg.is_found() {
                trace!(from = at, to = stop, "Leg unreachable");
                return None;
            }
            if let Some(arrival) = leg.arrival() {
                time = arrival;
            }
            route.extend(leg.route);
            at = stop;
        }

        Some(route)
    }

    /// Cost of visiting the required stops in `order`.
    pub fn ordering_cost(&mut self, order: &[&'a str]) -> u64 {
        if let Some(&cost) = self.costs.get(order) {
            return cost;
        }
        let cost = match self.construct_route(order) {
            Some(route) => self.legs.route_cost(&route, self.depart_at),
            None => INFEASIBLE_ORDER,
        };
        self.costs.insert(order.to_vec(), cost);
        cost
    }

    /// Number of distinct orderings evaluated so far.
    pub fn evaluations(&self) -> usize {
        self.costs.len()
    }

    /// Largest tabu memory size reached by any run of this sequencer.
    pub fn peak_tabu_len(&self) -> usize {
        self.peak_tabu_len
    }

    fn remember(&mut self, tabu: &mut TabuMemory, order: &[&str]) {
        tabu.record(ordering_digest(order));
        self.peak_tabu_len = self.peak_tabu_len.max(tabu.len());
    }

    /// Tabu Search with aspiration, starting from `required` as given.
    ///
    /// With no required stops this is exactly a direct leg search from start
    /// to goal. Otherwise the result is the best ordering found within
    /// `max_iterations`, or [`Itinerary::infeasible`] if none was feasible.
    pub fn run(&mut self, required: &[&'a str], max_iterations: usize) -> Itinerary {
        if required.is_empty() {
            return self.legs.search_leg(self.start, self.goal, self.depart_at);
        }

        let mut current = required.to_vec();
        let mut best_cost = self.ordering_cost(&current);
        let mut best_order = current.clone();

        let mut tabu = TabuMemory::new(2 * required.len());
        self.remember(&mut tabu, &current);

        let mut iterations = 0;
        while iterations < max_iterations {
            iterations += 1;

            let Some(next) = self.scan_neighbourhood(&current, &tabu, best_cost) else {
                trace!(iterations, "No admissible neighbour");
                break;
            };

            if next.cost < best_cost {
                best_cost = next.cost;
                best_order = next.order.clone();
                debug!(iterations, cost = best_cost, order = ?best_order, "New best ordering");
            }

            self.remember(&mut tabu, &next.order);
            current = next.order;
        }

        debug!(
            iterations,
            evaluations = self.evaluations(),
            tabu = tabu.len(),
            "Tabu search finished"
        );
        self.finish(&best_order, best_cost)
    }

    /// Tabu Search from a shuffled start with nested step/move budgets.
    ///
    /// Each of `step_limit` outer steps makes up to `op_limit` moves, and a
    /// move is taken only if it strictly improves the current ordering.
    pub fn run_knox<R: Rng + ?Sized>(
        &mut self,
        required: &[&'a str],
        step_limit: usize,
        op_limit: usize,
        rng: &mut R,
    ) -> Itinerary {
        if required.is_empty() {
            return self.legs.search_leg(self.start, self.goal, self.depart_at);
        }

        let mut current = required.to_vec();
        current.shuffle(rng);
        let mut current_cost = self.ordering_cost(&current);
        let mut best_order = current.clone();
        let mut best_cost = current_cost;
        debug!(order = ?current, cost = current_cost, "Shuffled initial ordering");

        let mut tabu = TabuMemory::new(2 * required.len());
        self.remember(&mut tabu, &current);

        for step in 0..step_limit {
            for _ in 0..op_limit {
                let Some(next) = self.scan_neighbourhood(&current, &tabu, best_cost) else {
                    break;
                };
                if next.cost >= current_cost {
                    break;
                }
                self.remember(&mut tabu, &next.order);
                current = next.order;
                current_cost = next.cost;
            }

            if current_cost < best_cost {
                best_cost = current_cost;
                best_order = current.clone();
                debug!(step, cost = best_cost, order = ?best_order, "New best ordering");
            }
        }

        debug!(
            evaluations = self.evaluations(),
            tabu = tabu.len(),
            "Knox tabu search finished"
        );
        self.finish(&best_order, best_cost)
    }

    /// Pick the next move from the swap neighbourhood of `current`.
    ///
    /// A neighbour cheaper than `best_cost` is returned at once, tabu or
    /// not. Otherwise the cheapest feasible non-tabu neighbour wins, first
    /// found on ties.
    fn scan_neighbourhood(
        &mut self,
        current: &[&'a str],
        tabu: &TabuMemory,
        best_cost: u64,
    ) -> Option<Move<'a>> {
        let mut chosen: Option<Move<'a>> = None;

        for neighbor in swap_neighbors(current) {
            let cost = self.ordering_cost(&neighbor);
            if cost < best_cost {
                trace!(cost, "Aspiration move");
                return Some(Move {
                    order: neighbor,
                    cost,
                });
            }
            if cost == INFEASIBLE_ORDER || tabu.contains(ordering_digest(&neighbor)) {
                continue;
            }
            if chosen.as_ref().is_none_or(|m| cost < m.cost) {
                chosen = Some(Move {
                    order: neighbor,
                    cost,
                });
            }
        }

        chosen
    }

    fn finish(&self, order: &[&str], cost: u64) -> Itinerary {
        if cost == INFEASIBLE_ORDER {
            return Itinerary::infeasible();
        }
        match self.construct_route(order) {
            Some(route) => Itinerary::new(route, cost as f64),
            None => Itinerary::infeasible(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::connection::fixtures::*;
    use crate::domain::{INFEASIBLE_COST, count_transfers};
    use chrono::Duration;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::cell::Cell;
    use std::sync::Arc;

    /// Every leg is a single ten-minute connection whose line comes from a
    /// table, defaulting to a line unique to the stop pair.
    struct MockLegs {
        lines: HashMap<(&'static str, &'static str), &'static str>,
        unreachable: HashSet<(&'static str, &'static str)>,
        calls: Cell<usize>,
    }

    impl MockLegs {
        fn new(lines: &[(&'static str, &'static str, &'static str)]) -> Self {
            Self {
                lines: lines.iter().map(|&(a, b, l)| ((a, b), l)).collect(),
                unreachable: HashSet::new(),
                calls: Cell::new(0),
            }
        }
    }

    impl LegSearch for MockLegs {
        fn search_leg(&self, from: &str, to: &str, depart_at: TransitTime) -> Itinerary {
            self.calls.set(self.calls.get() + 1);
            if from == to {
                return Itinerary::already_there();
            }
            if self
                .unreachable
                .iter()
                .any(|&(a, b)| a == from && b == to)
            {
                return Itinerary::not_found();
            }
            let line: Arc<str> = self
                .lines
                .iter()
                .find(|&(&(a, b), _)| a == from && b == to)
                .map(|(_, &l)| Arc::from(l))
                .unwrap_or_else(|| Arc::from(format!("{from}{to}")));
            let connection = Connection {
                id: self.calls.get() as u32,
                company: "MPK".into(),
                line,
                departure: depart_at,
                arrival: depart_at + Duration::minutes(10),
                origin: from.into(),
                destination: to.into(),
                origin_coords: coords_for(from),
                destination_coords: coords_for(to),
            };
            Itinerary::new(vec![connection], 0.0)
        }

        fn route_cost(&self, route: &[Connection], _depart_at: TransitTime) -> u64 {
            count_transfers(route) as u64
        }
    }

    fn stops(itinerary: &Itinerary) -> Vec<String> {
        itinerary
            .route
            .iter()
            .map(|c| c.destination.to_string())
            .collect()
    }

    #[test]
    fn tabu_memory_evicts_oldest() {
        let mut tabu = TabuMemory::new(2);
        tabu.record(1);
        tabu.record(2);
        tabu.record(3);

        assert_eq!(tabu.len(), 2);
        assert!(!tabu.contains(1));
        assert!(tabu.contains(2));
        assert!(tabu.contains(3));
    }

    #[test]
    fn tabu_memory_ignores_duplicates() {
        let mut tabu = TabuMemory::new(2);
        tabu.record(1);
        tabu.record(1);
        tabu.record(2);

        assert_eq!(tabu.len(), 2);
        assert!(tabu.contains(1));
    }

    #[test]
    fn zero_capacity_tabu_memory_stays_empty() {
        let mut tabu = TabuMemory::new(0);
        tabu.record(1);

        assert!(tabu.is_empty());
        assert!(!tabu.contains(1));
    }

    #[test]
    fn digest_is_order_sensitive() {
        assert_eq!(ordering_digest(&["A", "B"]), ordering_digest(&["A", "B"]));
        assert_ne!(ordering_digest(&["A", "B"]), ordering_digest(&["B", "A"]));
        // Concatenation must not collide
        assert_ne!(ordering_digest(&["AB", "C"]), ordering_digest(&["A", "BC"]));
    }

    #[test]
    fn swap_neighbourhood() {
        let neighbors = swap_neighbors(&["A", "B", "C"]);

        assert_eq!(
            neighbors,
            vec![vec!["B", "A", "C"], vec!["C", "B", "A"], vec!["A", "C", "B"]]
        );
        assert!(swap_neighbors(&["A"]).is_empty());
        assert!(swap_neighbors(&[]).is_empty());
    }

    #[test]
    fn route_chains_leg_arrivals() {
        let legs = MockLegs::new(&[]);
        let sequencer = WaypointSequencer::new(&legs, "S", "G", time("08:00:00"));

        let route = sequencer.construct_route(&["A", "B"]).unwrap();

        assert_eq!(route.len(), 3);
        assert_eq!(route[0].departure, time("08:00:00"));
        assert_eq!(route[1].departure, time("08:10:00"));
        assert_eq!(route[2].arrival, time("08:30:00"));
    }

    #[test]
    fn waypoint_at_start_is_feasible() {
        let legs = MockLegs::new(&[]);
        let sequencer = WaypointSequencer::new(&legs, "S", "G", time("08:00:00"));

        let route = sequencer.construct_route(&["S"]).unwrap();

        assert_eq!(route.len(), 1);
    }

    #[test]
    fn empty_required_set_is_direct_search() {
        let legs = MockLegs::new(&[]);
        let mut sequencer = WaypointSequencer::new(&legs, "S", "G", time("08:00:00"));

        let result = sequencer.run(&[], 100);
        let direct = legs.search_leg("S", "G", time("08:00:00"));

        assert_eq!(result.route.len(), direct.route.len());
        assert_eq!(result.cost, direct.cost);
        assert_eq!(stops(&result), vec!["G"]);
    }

    #[test]
    fn aspiration_finds_zero_transfer_order() {
        let legs = MockLegs::new(&[("S", "B", "1"), ("B", "A", "1"), ("A", "G", "1")]);
        let mut sequencer = WaypointSequencer::new(&legs, "S", "G", time("08:00:00"));

        let result = sequencer.run(&["A", "B"], 100);

        assert_eq!(result.cost, 0.0);
        assert_eq!(stops(&result), vec!["B", "A", "G"]);
        assert_eq!(count_transfers(&result.route), 0);
    }

    #[test]
    fn keeps_initial_order_when_nothing_is_better() {
        let legs = MockLegs::new(&[]);
        let mut sequencer = WaypointSequencer::new(&legs, "S", "G", time("08:00:00"));

        let result = sequencer.run(&["A", "B", "C"], 100);

        // Every leg has its own line, so every order costs three transfers
        assert_eq!(result.cost, 3.0);
        assert_eq!(stops(&result), vec!["A", "B", "C", "G"]);
    }

    #[test]
    fn single_waypoint() {
        let legs = MockLegs::new(&[("S", "A", "1"), ("A", "G", "1")]);
        let mut sequencer = WaypointSequencer::new(&legs, "S", "G", time("08:00:00"));

        let result = sequencer.run(&["A"], 100);

        assert_eq!(result.cost, 0.0);
        assert_eq!(stops(&result), vec!["A", "G"]);
    }

    #[test]
    fn infeasible_when_every_order_fails() {
        let mut legs = MockLegs::new(&[]);
        legs.unreachable.insert(("S", "A"));
        legs.unreachable.insert(("B", "A"));
        let mut sequencer = WaypointSequencer::new(&legs, "S", "G", time("08:00:00"));

        let result = sequencer.run(&["A", "B"], 100);

        assert_eq!(result, Itinerary::infeasible());
        assert_eq!(result.cost, INFEASIBLE_COST);
    }

    #[test]
    fn escapes_infeasible_initial_order() {
        let mut legs = MockLegs::new(&[]);
        legs.unreachable.insert(("S", "A"));
        let mut sequencer = WaypointSequencer::new(&legs, "S", "G", time("08:00:00"));

        let result = sequencer.run(&["A", "B"], 100);

        assert!(result.is_found());
        assert_eq!(stops(&result), vec!["B", "A", "G"]);
    }

    #[test]
    fn zero_iterations_evaluates_initial_order_only() {
        let legs = MockLegs::new(&[("S", "B", "1"), ("B", "A", "1"), ("A", "G", "1")]);
        let mut sequencer = WaypointSequencer::new(&legs, "S", "G", time("08:00:00"));

        let result = sequencer.run(&["A", "B"], 0);

        assert_eq!(stops(&result), vec!["A", "B", "G"]);
        assert_eq!(sequencer.evaluations(), 1);
    }

    #[test]
    fn ordering_costs_are_memoised() {
        let legs = MockLegs::new(&[]);
        let mut sequencer = WaypointSequencer::new(&legs, "S", "G", time("08:00:00"));

        let first = sequencer.ordering_cost(&["A", "B"]);
        let calls = legs.calls.get();
        let second = sequencer.ordering_cost(&["A", "B"]);

        assert_eq!(first, second);
        assert_eq!(legs.calls.get(), calls);
        assert_eq!(sequencer.evaluations(), 1);
    }

    #[test]
    fn knox_finds_zero_transfer_order() {
        let legs = MockLegs::new(&[
            ("S", "C", "1"),
            ("C", "A", "1"),
            ("A", "B", "1"),
            ("B", "G", "1"),
        ]);
        let mut sequencer = WaypointSequencer::new(&legs, "S", "G", time("08:00:00"));
        let mut rng = StdRng::seed_from_u64(42);

        let result = sequencer.run_knox(&["A", "B", "C"], 10, 10, &mut rng);

        assert!(result.is_found());
        assert_eq!(result.cost, count_transfers(&result.route) as f64);
    }

    #[test]
    fn knox_is_reproducible_with_seed() {
        let legs = MockLegs::new(&[("S", "B", "1"), ("B", "A", "1")]);
        let required = ["A", "B", "C", "D"];

        let mut first = WaypointSequencer::new(&legs, "S", "G", time("08:00:00"));
        let a = first.run_knox(&required, 5, 5, &mut StdRng::seed_from_u64(7));
        let mut second = WaypointSequencer::new(&legs, "S", "G", time("08:00:00"));
        let b = second.run_knox(&required, 5, 5, &mut StdRng::seed_from_u64(7));

        assert_eq!(stops(&a), stops(&b));
        assert_eq!(a.cost, b.cost);
    }

    #[test]
    fn knox_empty_required_set_is_direct_search() {
        let legs = MockLegs::new(&[]);
        let mut sequencer = WaypointSequencer::new(&legs, "S", "G", time("08:00:00"));

        let result = sequencer.run_knox(&[], 10, 10, &mut StdRng::seed_from_u64(1));

        assert_eq!(stops(&result), vec!["G"]);
    }

    #[test]
    fn knox_with_zero_steps_keeps_shuffled_order() {
        let legs = MockLegs::new(&[]);
        let mut sequencer = WaypointSequencer::new(&legs, "S", "G", time("08:00:00"));

        let result = sequencer.run_knox(&["A", "B"], 0, 10, &mut StdRng::seed_from_u64(3));

        assert!(result.is_found());
        assert_eq!(result.route.len(), 3);
        assert_eq!(sequencer.evaluations(), 1);
    }

    #[test]
    fn tabu_memory_fills_during_run() {
        let legs = MockLegs::new(&[]);
        let mut sequencer = WaypointSequencer::new(&legs, "S", "G", time("08:00:00"));

        sequencer.run(&["A", "B", "C"], 100);

        // Equal-cost orders keep the search moving until the memory fills
        assert!(sequencer.peak_tabu_len() > 1);
        assert!(sequencer.peak_tabu_len() <= 6);
    }

    #[test]
    fn direct_search_leaves_tabu_memory_unused() {
        let legs = MockLegs::new(&[]);
        let mut sequencer = WaypointSequencer::new(&legs, "S", "G", time("08:00:00"));

        sequencer.run(&[], 100);
        sequencer.run_knox(&[], 10, 10, &mut StdRng::seed_from_u64(1));

        assert_eq!(sequencer.peak_tabu_len(), 0);
    }

    #[test]
    fn tabu_memory_bounded_by_twice_required_stops() {
        let names = ["A", "B", "C", "D", "E"];
        let legs = MockLegs::new(&[("S", "C", "1"), ("C", "A", "1"), ("B", "D", "2")]);

        for n in 1..=names.len() {
            let required = &names[..n];

            let mut sequencer = WaypointSequencer::new(&legs, "S", "G", time("08:00:00"));
            sequencer.run(required, 200);
            assert!(sequencer.peak_tabu_len() >= 1);
            assert!(sequencer.peak_tabu_len() <= 2 * n, "run with {n} stops");

            for seed in 0..8 {
                let mut sequencer = WaypointSequencer::new(&legs, "S", "G", time("08:00:00"));
                let mut rng = StdRng::seed_from_u64(seed);
                sequencer.run_knox(required, 20, 20, &mut rng);
                assert!(sequencer.peak_tabu_len() >= 1);
                assert!(
                    sequencer.peak_tabu_len() <= 2 * n,
                    "knox with {n} stops, seed {seed}"
                );
            }
        }
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn tabu_memory_never_exceeds_capacity(
            capacity in 0usize..8,
            digests in prop::collection::vec(0u64..16, 0..64),
        ) {
            let mut tabu = TabuMemory::new(capacity);
            for digest in digests {
                tabu.record(digest);
                prop_assert!(tabu.len() <= tabu.capacity());
                prop_assert_eq!(tabu.queue.len(), tabu.members.len());
            }
        }

        #[test]
        fn most_recent_digest_is_remembered(
            capacity in 1usize..8,
            digests in prop::collection::vec(0u64..16, 1..64),
        ) {
            let mut tabu = TabuMemory::new(capacity);
            for &digest in &digests {
                tabu.record(digest);
                prop_assert!(tabu.contains(digest));
            }
        }

        #[test]
        fn swap_neighbours_are_permutations(n in 0usize..7) {
            let names: Vec<String> = (0..n).map(|i| format!("S{i}")).collect();
            let order: Vec<&str> = names.iter().map(String::as_str).collect();

            let neighbors = swap_neighbors(&order);

            prop_assert_eq!(neighbors.len(), n * n.saturating_sub(1) / 2);
            for neighbor in neighbors {
                let differing = neighbor.iter().zip(&order).filter(|(a, b)| a != b).count();
                prop_assert_eq!(differing, 2);
                let mut sorted = neighbor.clone();
                sorted.sort();
                let mut expected = order.clone();
                expected.sort();
                prop_assert_eq!(sorted, expected);
            }
        }
    }
}
