//! Goalreach Region - A concurrently populated, adaptively weighted goal region
//!
//! A background thread samples and validates goal candidates into a shared store
//! while the planner draws goals from it. Drawn goals are ranked by a weight that
//! the planner adjusts with `reward` / `penalize`; when every known goal looks
//! unpromising and sampling has paused, the region reopens and samples more.
//! A second, optional thread grows an external roadmap.
//!
//! ```ignore
//! let region = GoalRegion::builder(space)
//!     .sampler(|_, out| out.push(propose_goal()))
//!     .build()?;
//! region.start_sampling()?;
//!
//! let goal = region.goals().sample_weighted()?;
//! if try_reach(&goal.state) {
//!     region.goals().reward(goal.handle)?;
//! } else {
//!     region.goals().penalize(goal.handle)?;
//! }
//! ```

mod error;
mod queue;
mod region;
mod roadmap;
mod sampling;
mod store;
pub mod weight;
mod worker;

pub use error::RegionError;
pub use queue::{GoalHandle, WeightedQueue};
pub use region::{GoalRegion, GoalRegionBuilder};
pub use roadmap::RoadmapReport;
pub use sampling::{SamplerFn, SamplingOutcome, SamplingReport};
pub use store::{GoalStore, NewStateCallback, Task, TaskState, WeightedGoal};

pub use goalreach_core::{ConfigError, GoalSpace, RegionConfig, Roadmap};
