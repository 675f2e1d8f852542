//! Min-priority queue of search states.
//!
//! States are parked in a slab and the heap only orders `(key, slot)`
//! pairs, so state types need no `Ord` of their own. Equal keys pop in
//! insertion order, which keeps results deterministic.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

pub(crate) struct Frontier<K: Ord, S> {
    heap: BinaryHeap<Reverse<(K, usize)>>,
    slots: Vec<Option<S>>,
}

impl<K: Ord, S> Frontier<K, S> {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            slots: Vec::new(),
        }
    }

    pub fn push(&mut self, key: K, state: S) {
        let slot = self.slots.len();
        self.slots.push(Some(state));
        self.heap.push(Reverse((key, slot)));
    }

    /// Remove the state with the smallest key.
    pub fn pop(&mut self) -> Option<(K, S)> {
        let Reverse((key, slot)) = self.heap.pop()?;
        let state = self.slots[slot].take()?;
        Some((key, state))
    }

    /// Total number of states ever pushed.
    pub fn pushed(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_smallest_first() {
        let mut frontier = Frontier::new();
        frontier.push(3, "c");
        frontier.push(1, "a");
        frontier.push(2, "b");

        assert_eq!(frontier.pop(), Some((1, "a")));
        assert_eq!(frontier.pop(), Some((2, "b")));
        assert_eq!(frontier.pop(), Some((3, "c")));
        assert_eq!(frontier.pop(), None);
        assert_eq!(frontier.pushed(), 3);
    }

    #[test]
    fn ties_pop_in_insertion_order() {
        let mut frontier = Frontier::new();
        frontier.push((1, 5), "first");
        frontier.push((1, 5), "second");
        frontier.push((0, 9), "zeroth");

        assert_eq!(frontier.pop().map(|(_, s)| s), Some("zeroth"));
        assert_eq!(frontier.pop().map(|(_, s)| s), Some("first"));
        assert_eq!(frontier.pop().map(|(_, s)| s), Some("second"));
    }
}
