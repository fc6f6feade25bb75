//! The goal store: accepted goals, their weight queue, the sampling counters and
//! the worker states, all behind one lock.

use std::sync::Arc;

use goalreach_core::{GoalSpace, RegionConfig};
use parking_lot::{Condvar, Mutex, MutexGuard, RwLock};
use rand::Rng;
use tracing::{debug, info};

use crate::error::RegionError;
use crate::queue::{GoalHandle, WeightedQueue};
use crate::weight;

/// Called with every newly stored goal, after the store lock has been released.
pub type NewStateCallback<S> = Arc<dyn Fn(&S) + Send + Sync>;

/// A goal drawn through the weighted selector.
#[derive(Debug, Clone)]
pub struct WeightedGoal<S> {
    /// Copy of the goal state
    pub state: S,
    /// Weight at the time of the draw
    pub weight: f64,
    /// Handle for reporting back through `reward` / `penalize`
    pub handle: GoalHandle,
}

/// Lifecycle of a background worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskState {
    #[default]
    Idle,
    Running,
    Stopping,
}

/// The background tasks a region can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    Sampling,
    RoadmapGrowth,
}

impl Task {
    pub(crate) fn thread_name(self) -> &'static str {
        match self {
            Task::Sampling => "goal-sampler",
            Task::RoadmapGrowth => "roadmap-grower",
        }
    }
}

/// Per-session sampling bookkeeping.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Counters {
    pub attempts: u64,
    pub accepted: usize,
    pub target: usize,
    pub should_sample: bool,
}

impl Counters {
    fn new(target: usize) -> Self {
        Self {
            attempts: 0,
            accepted: 0,
            target,
            should_sample: true,
        }
    }
}

/// Everything guarded by the store lock.
pub(crate) struct RegionState<S> {
    pub goals: Vec<S>,
    pub queue: WeightedQueue,
    pub counters: Counters,
    next_consecutive: usize,
    sampling: TaskState,
    roadmap: TaskState,
}

impl<S> RegionState<S> {
    pub fn task(&self, task: Task) -> TaskState {
        match task {
            Task::Sampling => self.sampling,
            Task::RoadmapGrowth => self.roadmap,
        }
    }

    pub fn set_task(&mut self, task: Task, state: TaskState) {
        match task {
            Task::Sampling => self.sampling = state,
            Task::RoadmapGrowth => self.roadmap = state,
        }
    }

    /// Start a fresh sampling session.
    pub fn reset_counters(&mut self, target: usize) {
        self.counters = Counters::new(target);
    }
}

/// Result of offering a sampled candidate to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Offer {
    Accepted,
    TooClose,
    TargetReached,
}

/// Ordered, lock-protected container of accepted goals and their weights.
pub struct GoalStore<G: GoalSpace> {
    space: G,
    config: RegionConfig,
    state: Mutex<RegionState<G::State>>,
    wakeup: Condvar,
    callback: RwLock<Option<NewStateCallback<G::State>>>,
}

impl<G: GoalSpace> GoalStore<G> {
    /// Create an empty store. The config is assumed to be validated.
    pub fn new(space: G, config: RegionConfig) -> Self {
        let counters = Counters::new(config.max_sampled_goals);
        Self {
            space,
            config,
            state: Mutex::new(RegionState {
                goals: Vec::new(),
                queue: WeightedQueue::new(),
                counters,
                next_consecutive: 0,
                sampling: TaskState::Idle,
                roadmap: TaskState::Idle,
            }),
            wakeup: Condvar::new(),
            callback: RwLock::new(None),
        }
    }

    pub fn space(&self) -> &G {
        &self.space
    }

    pub fn config(&self) -> &RegionConfig {
        &self.config
    }

    /// Register a callback invoked with each newly stored goal.
    pub fn set_new_state_callback(&self, callback: impl Fn(&G::State) + Send + Sync + 'static) {
        *self.callback.write() = Some(Arc::new(callback));
    }

    pub fn clear_new_state_callback(&self) {
        *self.callback.write() = None;
    }

    // ---- Insertion ----

    /// Append a goal. The new-state callback, if any, runs after the lock is released.
    pub fn add(&self, state: G::State) {
        let added = {
            let mut guard = self.state.lock();
            self.push_locked(&mut guard, state)
        };
        self.notify_new_state(&added);
    }

    /// Append a goal only if every existing goal is farther than `min_distance`.
    pub fn add_if_far_enough(&self, state: G::State, min_distance: f64) -> bool {
        let added = {
            let mut guard = self.state.lock();
            if self.nearest_locked(&guard, &state) <= min_distance {
                return false;
            }
            self.push_locked(&mut guard, state)
        };
        self.notify_new_state(&added);
        true
    }

    /// Offer a validated candidate from the sampling worker. Never exceeds the target.
    pub(crate) fn offer_sampled(&self, state: G::State) -> Offer {
        let added = {
            let mut guard = self.state.lock();
            let counters = guard.counters;
            if counters.accepted >= counters.target {
                guard.counters.should_sample = false;
                return Offer::TargetReached;
            }
            if let Some(min_distance) = self.config.min_goal_distance {
                if self.nearest_locked(&guard, &state) <= min_distance {
                    return Offer::TooClose;
                }
            }
            let added = self.push_locked(&mut guard, state);
            guard.counters.accepted += 1;
            if guard.counters.accepted >= guard.counters.target {
                guard.counters.should_sample = false;
            }
            added
        };
        debug!("Adding goal state");
        self.notify_new_state(&added);
        Offer::Accepted
    }

    fn push_locked(&self, guard: &mut RegionState<G::State>, state: G::State) -> G::State {
        guard.queue.push(self.config.initial_weight);
        guard.goals.push(state.clone());
        state
    }

    fn notify_new_state(&self, state: &G::State) {
        let callback = self.callback.read().clone();
        if let Some(callback) = callback {
            callback(state);
        }
    }

    // ---- Reads ----

    /// Copy of the goal at `index`.
    pub fn get(&self, index: usize) -> Result<G::State, RegionError> {
        let guard = self.state.lock();
        guard
            .goals
            .get(index)
            .cloned()
            .ok_or(RegionError::OutOfRange {
                index,
                len: guard.goals.len(),
            })
    }

    /// Snapshot of every stored goal in insertion order.
    pub fn states(&self) -> Vec<G::State> {
        self.state.lock().goals.clone()
    }

    pub fn size(&self) -> usize {
        self.state.lock().goals.len()
    }

    pub fn has_any(&self) -> bool {
        !self.state.lock().goals.is_empty()
    }

    /// Current sampling target. Grows each time the region reopens.
    pub fn max_target(&self) -> usize {
        self.state.lock().counters.target
    }

    /// Sampling iterations this session that produced at least one goal.
    pub fn attempts(&self) -> u64 {
        self.state.lock().counters.attempts
    }

    /// Goals accepted by the sampling worker this session.
    pub fn accepted(&self) -> usize {
        self.state.lock().counters.accepted
    }

    /// Whether the sampling worker still has room below its target.
    pub fn should_sample(&self) -> bool {
        self.state.lock().counters.should_sample
    }

    /// Distance from `state` to the nearest stored goal, infinite when empty.
    pub fn distance(&self, state: &G::State) -> f64 {
        let guard = self.state.lock();
        self.nearest_locked(&guard, state)
    }

    fn nearest_locked(&self, guard: &RegionState<G::State>, state: &G::State) -> f64 {
        guard
            .goals
            .iter()
            .map(|goal| self.space.distance(goal, state))
            .fold(f64::INFINITY, f64::min)
    }

    /// Empty the goals and the weight queue together.
    pub fn clear(&self) {
        let mut guard = self.state.lock();
        guard.goals.clear();
        guard.queue.clear();
        guard.next_consecutive = 0;
    }

    // ---- Selection ----

    /// Uniform random draw over stored goals, ignoring weights.
    pub fn sample_uniform(&self) -> Result<G::State, RegionError> {
        let guard = self.state.lock();
        if guard.goals.is_empty() {
            return Err(RegionError::EmptyRegion);
        }
        let index = rand::thread_rng().gen_range(0..guard.goals.len());
        Ok(guard.goals[index].clone())
    }

    /// Round-robin draw through stored goals in insertion order.
    pub fn sample_consecutive(&self) -> Result<G::State, RegionError> {
        let mut guard = self.state.lock();
        if guard.goals.is_empty() {
            return Err(RegionError::EmptyRegion);
        }
        let index = guard.next_consecutive % guard.goals.len();
        guard.next_consecutive = index + 1;
        Ok(guard.goals[index].clone())
    }

    /// The most preferred goal. Does not change any weight.
    pub fn sample_weighted(&self) -> Result<WeightedGoal<G::State>, RegionError> {
        let guard = self.state.lock();
        let (handle, weight) = guard.queue.top().ok_or(RegionError::EmptyRegion)?;
        Ok(WeightedGoal {
            state: guard.goals[handle.index()].clone(),
            weight,
            handle,
        })
    }

    pub fn weight(&self, handle: GoalHandle) -> Option<f64> {
        self.state.lock().queue.weight(handle)
    }

    /// Weights of all goals in insertion order.
    pub fn weights(&self) -> Vec<f64> {
        self.state.lock().queue.weights()
    }

    // ---- Feedback ----

    /// Record a failed attempt on a goal and return its new weight.
    ///
    /// If the goal was already below the reopen threshold and the sampling
    /// worker has paused, every goal is reset to the reset weight and the
    /// sampling target grows so the worker resumes.
    pub fn penalize(&self, handle: GoalHandle) -> Result<f64, RegionError> {
        let mut guard = self.state.lock();
        let w = guard.queue.weight(handle).ok_or(stale(handle))?;
        let mut new_weight = weight::penalized(w);
        guard.queue.update(handle, new_weight);

        if w < self.config.reopen_threshold && !guard.counters.should_sample {
            guard.queue.reset_all(self.config.reset_weight);
            guard.counters.should_sample = true;
            guard.counters.target += self.config.target_increment;
            new_weight = self.config.reset_weight;
            info!(
                "Reopening goal region: {} goals reset to {}, sampling target now {}",
                guard.goals.len(),
                self.config.reset_weight,
                guard.counters.target
            );
            drop(guard);
            self.wakeup.notify_all();
        }
        Ok(new_weight)
    }

    /// Record a successful attempt on a goal and return its new weight.
    pub fn reward(&self, handle: GoalHandle) -> Result<f64, RegionError> {
        let mut guard = self.state.lock();
        let w = guard.queue.weight(handle).ok_or(stale(handle))?;
        if w < weight::MAX_WEIGHT {
            let new_weight = weight::rewarded(w);
            guard.queue.update(handle, new_weight);
            return Ok(new_weight);
        }
        Ok(w)
    }

    // ---- Worker coordination ----

    pub(crate) fn lock(&self) -> MutexGuard<'_, RegionState<G::State>> {
        self.state.lock()
    }

    pub(crate) fn wakeup(&self) -> &Condvar {
        &self.wakeup
    }

    pub(crate) fn task_state(&self, task: Task) -> TaskState {
        self.state.lock().task(task)
    }
}

fn stale(handle: GoalHandle) -> RegionError {
    RegionError::StaleHandle {
        slot: handle.slot,
        generation: handle.generation,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Points on a line inside [0, 100]; negative values are out of bounds,
    /// multiples of 7 are invalid.
    pub(crate) struct LineSpace {
        pub ready: AtomicBool,
    }

    impl LineSpace {
        pub fn ready() -> Self {
            Self {
                ready: AtomicBool::new(true),
            }
        }
    }

    impl GoalSpace for LineSpace {
        type State = f64;

        fn satisfies_bounds(&self, state: &f64) -> bool {
            (0.0..=100.0).contains(state)
        }

        fn is_valid(&self, state: &f64) -> bool {
            *state == 0.0 || *state % 7.0 != 0.0
        }

        fn distance(&self, a: &f64, b: &f64) -> f64 {
            (a - b).abs()
        }

        fn is_ready(&self) -> bool {
            self.ready.load(Ordering::Acquire)
        }
    }

    fn store() -> GoalStore<LineSpace> {
        GoalStore::new(LineSpace::ready(), RegionConfig::default())
    }

    #[test]
    fn add_and_get() {
        let store = store();
        store.add(1.0);
        store.add(2.5);
        assert_eq!(store.size(), 2);
        assert!(store.has_any());
        assert_eq!(store.get(1).unwrap(), 2.5);
        assert_eq!(store.states(), vec![1.0, 2.5]);
    }

    #[test]
    fn get_out_of_range() {
        let store = store();
        store.add(1.0);
        match store.get(1) {
            Err(RegionError::OutOfRange { index: 1, len: 1 }) => {}
            other => panic!("expected OutOfRange, got: {:?}", other),
        }
    }

    #[test]
    fn add_if_far_enough_respects_distance() {
        let store = store();
        store.add(0.0);

        assert!(!store.add_if_far_enough(0.5, 1.0));
        assert_eq!(store.size(), 1);

        assert!(store.add_if_far_enough(2.0, 1.0));
        assert_eq!(store.size(), 2);
    }

    #[test]
    fn distance_to_nearest_goal() {
        let store = store();
        assert_eq!(store.distance(&3.0), f64::INFINITY);
        store.add(1.0);
        store.add(10.0);
        assert_eq!(store.distance(&3.0), 2.0);
        assert_eq!(store.distance(&9.0), 1.0);
    }

    #[test]
    fn clear_behaves_like_new() {
        let store = store();
        store.add(1.0);
        store.add(2.0);
        let drawn = store.sample_weighted().unwrap();

        store.clear();
        assert_eq!(store.size(), 0);
        assert!(!store.has_any());
        assert!(matches!(store.sample_weighted(), Err(RegionError::EmptyRegion)));
        assert!(matches!(store.sample_uniform(), Err(RegionError::EmptyRegion)));
        assert!(matches!(store.sample_consecutive(), Err(RegionError::EmptyRegion)));
        assert!(matches!(
            store.penalize(drawn.handle),
            Err(RegionError::StaleHandle { .. })
        ));
        assert!(store.weights().is_empty());
    }

    #[test]
    fn consecutive_cycles_in_insertion_order() {
        let store = store();
        for x in [1.0, 2.0, 3.0] {
            store.add(x);
        }
        let drawn: Vec<f64> = (0..5).map(|_| store.sample_consecutive().unwrap()).collect();
        assert_eq!(drawn, vec![1.0, 2.0, 3.0, 1.0, 2.0]);
    }

    #[test]
    fn uniform_draws_stored_goals() {
        let store = store();
        for x in [1.0, 2.0, 3.0] {
            store.add(x);
        }
        for _ in 0..20 {
            let x = store.sample_uniform().unwrap();
            assert!([1.0, 2.0, 3.0].contains(&x));
        }
    }

    #[test]
    fn weighted_draw_is_read_only() {
        let store = store();
        store.add(4.0);
        store.add(5.0);
        let first = store.sample_weighted().unwrap();
        let second = store.sample_weighted().unwrap();
        assert_eq!(first.handle, second.handle);
        assert_eq!(first.state, 4.0);
        assert_eq!(first.weight, 1.0);
    }

    #[test]
    fn penalize_moves_goal_back() {
        let store = store();
        store.add(4.0);
        store.add(5.0);
        let first = store.sample_weighted().unwrap();
        assert_eq!(store.penalize(first.handle).unwrap(), 0.5);

        let next = store.sample_weighted().unwrap();
        assert_eq!(next.state, 5.0);
        assert_eq!(store.weight(first.handle), Some(0.5));
    }

    #[test]
    fn reward_caps_at_one() {
        let store = store();
        store.add(4.0);
        let goal = store.sample_weighted().unwrap();
        assert_eq!(store.penalize(goal.handle).unwrap(), 0.5);
        assert_eq!(store.reward(goal.handle).unwrap(), 1.0);
        assert_eq!(store.reward(goal.handle).unwrap(), 1.0);
    }

    #[test]
    fn low_weight_while_sampling_does_not_reopen() {
        let store = store();
        store.add(4.0);
        let goal = store.sample_weighted().unwrap();
        for _ in 0..10 {
            store.penalize(goal.handle).unwrap();
        }
        assert!(store.weight(goal.handle).unwrap() < 0.2);
        assert_eq!(store.max_target(), 10);
        assert!(store.should_sample());
    }

    #[test]
    fn region_reset_when_paused() {
        let store = store();
        store.add(4.0);
        store.add(5.0);
        store.add(6.0);
        store.lock().counters.should_sample = false;

        let goal = store.sample_weighted().unwrap();
        while store.weight(goal.handle).unwrap() >= 0.2 {
            store.penalize(goal.handle).unwrap();
        }
        assert!(!store.should_sample());
        assert_eq!(store.max_target(), 10);

        assert_eq!(store.penalize(goal.handle).unwrap(), 0.5);
        assert_eq!(store.weights(), vec![0.5; 3]);
        assert_eq!(store.max_target(), 20);
        assert!(store.should_sample());
        assert_eq!(store.sample_weighted().unwrap().state, 4.0);
    }

    #[test]
    fn callback_fires_outside_lock() {
        let store = Arc::new(store());
        let seen = Arc::new(AtomicUsize::new(0));

        let reentrant = Arc::clone(&store);
        let counter = Arc::clone(&seen);
        store.set_new_state_callback(move |_| {
            // Re-entering the store would deadlock if the lock were still held.
            counter.store(reentrant.size(), Ordering::SeqCst);
        });

        store.add(1.0);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert!(store.add_if_far_enough(5.0, 1.0));
        assert_eq!(seen.load(Ordering::SeqCst), 2);
        assert!(!store.add_if_far_enough(5.5, 1.0));
        assert_eq!(seen.load(Ordering::SeqCst), 2);

        store.clear_new_state_callback();
        store.add(9.0);
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn offer_sampled_stops_at_target() {
        let config = RegionConfig {
            max_sampled_goals: 2,
            ..Default::default()
        };
        let store = GoalStore::new(LineSpace::ready(), config);
        assert_eq!(store.offer_sampled(1.0), Offer::Accepted);
        assert!(store.should_sample());
        assert_eq!(store.offer_sampled(2.0), Offer::Accepted);
        assert!(!store.should_sample());
        assert_eq!(store.offer_sampled(3.0), Offer::TargetReached);
        assert_eq!(store.size(), 2);
        assert_eq!(store.accepted(), 2);
    }

    #[test]
    fn offer_sampled_honours_min_distance() {
        let config = RegionConfig {
            min_goal_distance: Some(1.0),
            ..Default::default()
        };
        let store = GoalStore::new(LineSpace::ready(), config);
        assert_eq!(store.offer_sampled(1.0), Offer::Accepted);
        assert_eq!(store.offer_sampled(1.5), Offer::TooClose);
        assert_eq!(store.offer_sampled(3.0), Offer::Accepted);
        assert_eq!(store.accepted(), 2);
    }
}
