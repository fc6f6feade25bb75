//! The goal sampling loop run by the `goal-sampler` thread.

use std::sync::Arc;

use goalreach_core::GoalSpace;
use tracing::{debug, trace, warn};

use crate::store::{GoalStore, Offer, Task, TaskState};

/// Produces raw goal candidates. Called repeatedly; may push nothing.
pub type SamplerFn<G> =
    Arc<dyn Fn(&GoalStore<G>, &mut Vec<<G as GoalSpace>::State>) + Send + Sync>;

/// Why the sampling thread stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingOutcome {
    /// Sampled until asked to stop
    Stopped,
    /// No sampling function was configured; nothing was done
    NoSampler,
    /// Asked to stop before the space became ready; nothing was done
    NeverReady,
}

/// Summary returned when the sampling thread is joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingReport {
    pub outcome: SamplingOutcome,
    /// Sampling iterations that produced at least one goal
    pub attempts: u64,
    /// Goals accepted during the session
    pub accepted: usize,
}

/// Body of the sampling thread.
pub(crate) fn run<G: GoalSpace>(
    store: &Arc<GoalStore<G>>,
    sampler: Option<SamplerFn<G>>,
) -> SamplingReport {
    let ready = wait_until_ready(store);

    let outcome = match (&sampler, ready) {
        (Some(sampler), true) => {
            debug!("Beginning sampling thread computation");
            sample_until_stopped(store, sampler.as_ref());
            SamplingOutcome::Stopped
        }
        (None, _) => {
            warn!("Goal sampling thread never did any work. No sampling function set.");
            SamplingOutcome::NoSampler
        }
        (Some(_), false) => {
            warn!("Goal sampling thread never did any work. Space was never ready.");
            SamplingOutcome::NeverReady
        }
    };

    let counters = store.lock().counters;
    debug!(
        "Stopped goal sampling thread after {} sampling attempts",
        counters.attempts
    );
    SamplingReport {
        outcome,
        attempts: counters.attempts,
        accepted: counters.accepted,
    }
}

/// Block until the space reports ready. Returns `false` if a stop came first.
fn wait_until_ready<G: GoalSpace>(store: &GoalStore<G>) -> bool {
    let poll = store.config().ready_poll_interval();
    let mut guard = store.lock();
    if !store.space().is_ready() {
        debug!("Waiting for the space to be ready before the sampling thread can begin computation...");
    }
    loop {
        if guard.task(Task::Sampling) != TaskState::Running {
            return false;
        }
        if store.space().is_ready() {
            return true;
        }
        store.wakeup().wait_for(&mut guard, poll);
    }
}

fn sample_until_stopped<G: GoalSpace>(
    store: &GoalStore<G>,
    sampler: &(dyn Fn(&GoalStore<G>, &mut Vec<G::State>) + Send + Sync),
) {
    let space = store.space();
    let mut candidates = Vec::new();

    loop {
        {
            let mut guard = store.lock();
            loop {
                if guard.task(Task::Sampling) != TaskState::Running {
                    return;
                }
                if guard.counters.accepted < guard.counters.target {
                    break;
                }
                // Paused until the region reopens or a stop is requested.
                guard.counters.should_sample = false;
                store.wakeup().wait(&mut guard);
            }
        }

        candidates.clear();
        sampler(store, &mut candidates);

        let mut accepted_any = false;
        for candidate in candidates.drain(..) {
            // A callback may have asked this thread to stop mid-batch.
            if store.task_state(Task::Sampling) != TaskState::Running {
                break;
            }
            if !(space.satisfies_bounds(&candidate) && space.is_valid(&candidate)) {
                debug!("Invalid goal candidate");
                continue;
            }
            match store.offer_sampled(candidate) {
                Offer::Accepted => accepted_any = true,
                Offer::TooClose => trace!("Goal candidate too close to an existing goal"),
                Offer::TargetReached => break,
            }
        }

        if accepted_any {
            store.lock().counters.attempts += 1;
        }
    }
}
