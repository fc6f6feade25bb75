//! Goalreach Core - Contracts shared by the goal-region sampler and its owner
//!
//! This crate provides the pieces a planner injects into the sampler:
//! - `GoalSpace`: bounds, validity, distance and readiness oracles over a state type
//! - `Roadmap`: an externally owned connectivity structure grown in the background
//! - `RegionConfig`: tunables for sampling targets, weighting and worker timing

pub mod config;
pub mod roadmap;
pub mod space;

pub use config::{ConfigError, RegionConfig};
pub use roadmap::Roadmap;
pub use space::GoalSpace;
