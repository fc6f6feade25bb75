//! State-space oracles injected by the planner

use std::sync::Arc;

/// The geometric side of a goal region: what a state is, whether it is usable,
/// and how far apart two states are.
///
/// All methods must be free of side effects on the sampler. They are called
/// from the sampling thread as well as from the planning thread.
pub trait GoalSpace: Send + Sync + 'static {
    /// A configuration in this space. Goals are cloned out of the store, never
    /// borrowed across the lock.
    type State: Clone + Send + Sync + 'static;

    /// Whether the state lies inside the space bounds.
    fn satisfies_bounds(&self, state: &Self::State) -> bool;

    /// Whether the state is usable as a goal (collision free, constraints met, ...).
    fn is_valid(&self, state: &Self::State) -> bool;

    /// Distance between two states.
    fn distance(&self, a: &Self::State, b: &Self::State) -> f64;

    /// Whether the planning infrastructure has finished initializing.
    ///
    /// The sampling worker does not produce candidates until this returns `true`.
    fn is_ready(&self) -> bool {
        true
    }
}

impl<T: GoalSpace> GoalSpace for Arc<T> {
    type State = T::State;

    fn satisfies_bounds(&self, state: &Self::State) -> bool {
        (**self).satisfies_bounds(state)
    }

    fn is_valid(&self, state: &Self::State) -> bool {
        (**self).is_valid(state)
    }

    fn distance(&self, a: &Self::State, b: &Self::State) -> f64 {
        (**self).distance(a, b)
    }

    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }
}
