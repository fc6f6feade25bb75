use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Errors raised when a `RegionConfig` cannot drive a sampler.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} must lie in (0, 1], got {value}")]
    InvalidWeight { field: &'static str, value: f64 },

    #[error("reopen threshold must lie in (0, 1), got {0}")]
    InvalidThreshold(f64),

    #[error("max_sampled_goals must be at least 1")]
    ZeroTarget,

    #[error("roadmap budget must be positive and fit in a Duration, got {0}s")]
    InvalidBudget(f64),

    #[error("minimum goal distance must be non-negative and finite, got {0}")]
    InvalidDistance(f64),
}

/// Sampler tunables. Every field has a default so partial TOML tables load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionConfig {
    /// Goals the sampling worker accepts before pausing
    pub max_sampled_goals: usize,
    /// How much the target grows each time the region is reopened
    pub target_increment: usize,
    /// A penalized weight below this (while sampling is paused) reopens the region
    pub reopen_threshold: f64,
    /// Weight every goal is reset to when the region reopens
    pub reset_weight: f64,
    /// Weight a goal enters the queue with
    pub initial_weight: f64,
    /// Readiness poll interval in milliseconds
    pub ready_poll_ms: u64,
    /// Budget handed to `Roadmap::grow` per iteration, in seconds
    pub roadmap_budget_secs: f64,
    /// When set, sampled goals closer than this to an existing goal are dropped
    pub min_goal_distance: Option<f64>,
    /// Start the sampling worker as soon as the region is built
    pub auto_start: bool,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            max_sampled_goals: 10,
            target_increment: 10,
            reopen_threshold: 0.2,
            reset_weight: 0.5,
            initial_weight: 1.0,
            ready_poll_ms: 10,
            roadmap_budget_secs: 0.1,
            min_goal_distance: None,
            auto_start: false,
        }
    }
}

impl RegionConfig {
    /// Readiness poll interval as a `Duration`.
    pub fn ready_poll_interval(&self) -> Duration {
        Duration::from_millis(self.ready_poll_ms.max(1))
    }

    /// Roadmap growth budget as a `Duration`. Zero for values `validate` rejects.
    pub fn roadmap_budget(&self) -> Duration {
        Duration::try_from_secs_f64(self.roadmap_budget_secs).unwrap_or_default()
    }

    /// Check that the weighting parameters keep weights inside (0, 1].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_sampled_goals == 0 {
            return Err(ConfigError::ZeroTarget);
        }
        check_weight("initial_weight", self.initial_weight)?;
        check_weight("reset_weight", self.reset_weight)?;
        if !(self.reopen_threshold > 0.0 && self.reopen_threshold < 1.0) {
            return Err(ConfigError::InvalidThreshold(self.reopen_threshold));
        }
        let budget = Duration::try_from_secs_f64(self.roadmap_budget_secs);
        if !(self.roadmap_budget_secs > 0.0 && budget.is_ok()) {
            return Err(ConfigError::InvalidBudget(self.roadmap_budget_secs));
        }
        if let Some(d) = self.min_goal_distance {
            if !(d.is_finite() && d >= 0.0) {
                return Err(ConfigError::InvalidDistance(d));
            }
        }
        Ok(())
    }
}

fn check_weight(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidWeight { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = RegionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_sampled_goals, 10);
        assert_eq!(config.target_increment, 10);
        assert_eq!(config.ready_poll_interval(), Duration::from_millis(10));
        assert_eq!(config.roadmap_budget(), Duration::from_millis(100));
    }

    #[test]
    fn rejects_out_of_range_weights() {
        let config = RegionConfig {
            initial_weight: 0.0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidWeight {
                field: "initial_weight",
                value: 0.0
            })
        );

        let config = RegionConfig {
            reset_weight: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidWeight { field: "reset_weight", .. })
        ));
    }

    #[test]
    fn rejects_zero_target_and_bad_budget() {
        let config = RegionConfig {
            max_sampled_goals: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroTarget));

        let config = RegionConfig {
            roadmap_budget_secs: f64::NAN,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidBudget(_))));

        let config = RegionConfig {
            min_goal_distance: Some(-1.0),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidDistance(-1.0)));
    }

    #[test]
    fn rejects_budget_too_large_for_duration() {
        let config = RegionConfig {
            roadmap_budget_secs: 1e30,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidBudget(1e30)));
        assert_eq!(config.roadmap_budget(), Duration::ZERO);

        let config = RegionConfig {
            roadmap_budget_secs: f64::INFINITY,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidBudget(_))));
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: RegionConfig = toml::from_str(
            r#"
            max_sampled_goals = 4
            min_goal_distance = 0.25
            "#,
        )
        .unwrap();
        assert_eq!(config.max_sampled_goals, 4);
        assert_eq!(config.min_goal_distance, Some(0.25));
        assert_eq!(config.reset_weight, 0.5);
        assert!(!config.auto_start);
    }
}
