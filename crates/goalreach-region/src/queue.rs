//! Indexed max-heap of goal weights.
//!
//! Entries live in an arena indexed by slot (one slot per goal, in insertion
//! order). The heap stores slot ids and every entry records its heap position,
//! so a weight change can be re-sifted in place without searching.

use std::cmp::Ordering;
use std::fmt;

/// Generational handle to a queued goal. Handles issued before a `clear` are stale.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct GoalHandle {
    pub(crate) slot: u32,
    pub(crate) generation: u32,
}

impl GoalHandle {
    /// Index of the goal this handle ranks (its position in the goal store).
    pub fn index(&self) -> usize {
        self.slot as usize
    }

    /// Queue generation this handle was issued in.
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for GoalHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GoalHandle({}v{})", self.slot, self.generation)
    }
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    weight: f64,
    position: usize,
}

/// Priority queue over goal weights. Higher weight ranks first; equal weights
/// rank the earlier inserted goal first.
#[derive(Debug, Default)]
pub struct WeightedQueue {
    entries: Vec<Entry>,
    heap: Vec<u32>,
    generation: u32,
}

impl WeightedQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Queue a new goal with the given weight. Its slot is the next goal index.
    pub fn push(&mut self, weight: f64) -> GoalHandle {
        let slot = self.entries.len() as u32;
        let position = self.heap.len();
        self.entries.push(Entry { weight, position });
        self.heap.push(slot);
        self.sift_up(position);
        self.handle(slot)
    }

    /// The most preferred goal and its weight.
    pub fn top(&self) -> Option<(GoalHandle, f64)> {
        let &slot = self.heap.first()?;
        Some((self.handle(slot), self.entries[slot as usize].weight))
    }

    /// Current weight of a goal, or `None` for a stale handle.
    pub fn weight(&self, handle: GoalHandle) -> Option<f64> {
        self.entry(handle).map(|e| e.weight)
    }

    /// Weights of all goals in insertion order.
    pub fn weights(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.weight).collect()
    }

    /// Change a goal's weight and restore heap order. Returns `false` for a stale handle.
    pub fn update(&mut self, handle: GoalHandle, weight: f64) -> bool {
        let Some(entry) = self.entry(handle) else {
            return false;
        };
        let position = entry.position;
        self.entries[handle.slot as usize].weight = weight;
        let position = self.sift_up(position);
        self.sift_down(position);
        true
    }

    /// Force every goal to `weight` and rebuild the heap.
    pub fn reset_all(&mut self, weight: f64) {
        for entry in &mut self.entries {
            entry.weight = weight;
        }
        for position in (0..self.heap.len() / 2).rev() {
            self.sift_down(position);
        }
    }

    /// Drop every entry. Handles issued so far become stale.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.heap.clear();
        self.generation = self.generation.wrapping_add(1);
    }

    fn handle(&self, slot: u32) -> GoalHandle {
        GoalHandle {
            slot,
            generation: self.generation,
        }
    }

    fn entry(&self, handle: GoalHandle) -> Option<&Entry> {
        if handle.generation != self.generation {
            return None;
        }
        self.entries.get(handle.slot as usize)
    }

    // ---- Heap maintenance ----

    /// Whether slot `a` should sit above slot `b`.
    fn ranks_before(&self, a: u32, b: u32) -> bool {
        let wa = self.entries[a as usize].weight;
        let wb = self.entries[b as usize].weight;
        match wa.total_cmp(&wb) {
            Ordering::Greater => true,
            Ordering::Less => false,
            Ordering::Equal => a < b,
        }
    }

    fn swap(&mut self, i: usize, j: usize) {
        self.heap.swap(i, j);
        self.entries[self.heap[i] as usize].position = i;
        self.entries[self.heap[j] as usize].position = j;
    }

    fn sift_up(&mut self, mut position: usize) -> usize {
        while position > 0 {
            let parent = (position - 1) / 2;
            if !self.ranks_before(self.heap[position], self.heap[parent]) {
                break;
            }
            self.swap(position, parent);
            position = parent;
        }
        position
    }

    fn sift_down(&mut self, mut position: usize) -> usize {
        let len = self.heap.len();
        loop {
            let left = 2 * position + 1;
            let right = left + 1;
            let mut best = position;
            if left < len && self.ranks_before(self.heap[left], self.heap[best]) {
                best = left;
            }
            if right < len && self.ranks_before(self.heap[right], self.heap[best]) {
                best = right;
            }
            if best == position {
                return position;
            }
            self.swap(position, best);
            position = best;
        }
    }
}
