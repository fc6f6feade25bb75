//! `GoalRegion`: the goal store plus its sampling and roadmap workers.

use std::sync::Arc;

use goalreach_core::{GoalSpace, RegionConfig, Roadmap};
use tracing::warn;

use crate::error::RegionError;
use crate::roadmap::{self, RoadmapReport};
use crate::sampling::{self, SamplerFn, SamplingReport};
use crate::store::{GoalStore, Task};
use crate::worker::Worker;

/// A lazily sampled, adaptively weighted goal region.
///
/// Owns the goal store and the two background workers. Dropping the region
/// stops both workers and waits for them to exit.
pub struct GoalRegion<G: GoalSpace> {
    store: Arc<GoalStore<G>>,
    sampler: Option<SamplerFn<G>>,
    roadmap: Option<Arc<dyn Roadmap>>,
    sampling: Worker<SamplingReport>,
    growing: Worker<RoadmapReport>,
}

impl<G: GoalSpace> GoalRegion<G> {
    /// Start building a region over `space`.
    pub fn builder(space: G) -> GoalRegionBuilder<G> {
        GoalRegionBuilder::new(space)
    }

    /// The shared goal store. Clone the `Arc` to hand it to other threads.
    pub fn goals(&self) -> &Arc<GoalStore<G>> {
        &self.store
    }

    // ---- Sampling ----

    /// Start the sampling worker. No-op if it is already running.
    ///
    /// Starting begins a new session: counters reset and the target returns to
    /// `max_sampled_goals`. Stored goals are kept.
    pub fn start_sampling(&self) -> Result<(), RegionError> {
        let target = self.store.config().max_sampled_goals;
        let sampler = self.sampler.clone();
        self.sampling.start(
            &self.store,
            |state| state.reset_counters(target),
            move |store| sampling::run(store, sampler),
        )?;
        Ok(())
    }

    /// Stop the sampling worker and wait for it. `None` if it was not started.
    pub fn stop_sampling(&self) -> Option<SamplingReport> {
        self.sampling.stop(&self.store)
    }

    pub fn is_sampling(&self) -> bool {
        self.sampling.is_running(&self.store)
    }

    /// Whether goals exist now or may appear later.
    pub fn could_sample(&self) -> bool {
        self.store.has_any() || self.is_sampling()
    }

    // ---- Roadmap ----

    /// Start growing the attached roadmap. No-op if already running.
    pub fn start_growing_roadmap(&self) -> Result<(), RegionError> {
        let Some(structure) = self.roadmap.clone() else {
            warn!("Roadmap growing thread never did any work. No roadmap attached.");
            return Ok(());
        };
        let budget = self.store.config().roadmap_budget();
        self.growing.start(
            &self.store,
            |_| {},
            move |store| roadmap::run(store, structure.as_ref(), budget),
        )?;
        Ok(())
    }

    /// Stop growing the roadmap and wait for it. `None` if it was not started.
    pub fn stop_growing_roadmap(&self) -> Option<RoadmapReport> {
        self.growing.stop(&self.store)
    }

    pub fn is_growing_roadmap(&self) -> bool {
        self.growing.is_running(&self.store)
    }

    pub fn roadmap(&self) -> Option<&Arc<dyn Roadmap>> {
        self.roadmap.as_ref()
    }
}

impl<G: GoalSpace> Drop for GoalRegion<G> {
    fn drop(&mut self) {
        self.stop_sampling();
        self.stop_growing_roadmap();
    }
}

/// Builder for `GoalRegion`.
pub struct GoalRegionBuilder<G: GoalSpace> {
    space: G,
    config: RegionConfig,
    sampler: Option<SamplerFn<G>>,
    roadmap: Option<Arc<dyn Roadmap>>,
    callback: Option<Box<dyn Fn(&G::State) + Send + Sync>>,
}

impl<G: GoalSpace> GoalRegionBuilder<G> {
    pub fn new(space: G) -> Self {
        Self {
            space,
            config: RegionConfig::default(),
            sampler: None,
            roadmap: None,
            callback: None,
        }
    }

    pub fn config(mut self, config: RegionConfig) -> Self {
        self.config = config;
        self
    }

    /// Function producing raw goal candidates for the sampling worker.
    pub fn sampler(
        mut self,
        sampler: impl Fn(&GoalStore<G>, &mut Vec<G::State>) + Send + Sync + 'static,
    ) -> Self {
        self.sampler = Some(Arc::new(sampler));
        self
    }

    /// External roadmap grown by the roadmap worker.
    pub fn roadmap(mut self, roadmap: Arc<dyn Roadmap>) -> Self {
        self.roadmap = Some(roadmap);
        self
    }

    /// Callback invoked with every newly stored goal.
    pub fn new_state_callback(mut self, callback: impl Fn(&G::State) + Send + Sync + 'static) -> Self {
        self.callback = Some(Box::new(callback));
        self
    }

    /// Validate the config and build the region, starting sampling if `auto_start` is set.
    pub fn build(self) -> Result<GoalRegion<G>, RegionError> {
        self.config.validate()?;
        let auto_start = self.config.auto_start;

        let store = Arc::new(GoalStore::new(self.space, self.config));
        if let Some(callback) = self.callback {
            store.set_new_state_callback(callback);
        }

        let region = GoalRegion {
            store,
            sampler: self.sampler,
            roadmap: self.roadmap,
            sampling: Worker::new(Task::Sampling),
            growing: Worker::new(Task::RoadmapGrowth),
        };
        if auto_start {
            region.start_sampling()?;
        }
        Ok(region)
    }
}
