//! A toy axis-aligned box scene with spherical obstacles.

use std::sync::atomic::{AtomicBool, Ordering};

use glam::Vec3;
use goalreach_core::GoalSpace;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Scene layout loaded from settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneSettings {
    /// Lower corner of the workspace box
    pub min: Vec3,
    /// Upper corner of the workspace box
    pub max: Vec3,
    /// Spherical obstacles as (center, radius)
    pub obstacles: Vec<(Vec3, f32)>,
    /// Where the robot starts; goals are checked by straight line from here
    pub start: Vec3,
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            min: Vec3::splat(-10.0),
            max: Vec3::splat(10.0),
            obstacles: vec![
                (Vec3::new(3.0, 0.0, 0.0), 2.0),
                (Vec3::new(-4.0, 4.0, 0.0), 2.5),
                (Vec3::new(0.0, -5.0, 3.0), 3.0),
            ],
            start: Vec3::ZERO,
        }
    }
}

impl SceneSettings {
    /// Reject boxes with inverted or non-finite corners and obstacles with bad radii.
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(self.min.is_finite() && self.max.is_finite()) {
            anyhow::bail!("scene corners must be finite");
        }
        if !self.min.cmple(self.max).all() {
            anyhow::bail!("scene min {} exceeds max {} on some axis", self.min, self.max);
        }
        if !self.start.is_finite() {
            anyhow::bail!("scene start must be finite");
        }
        for (center, radius) in &self.obstacles {
            if !(center.is_finite() && radius.is_finite() && *radius >= 0.0) {
                anyhow::bail!("obstacle at {} has invalid radius {}", center, radius);
            }
        }
        Ok(())
    }
}

pub struct BoxScene {
    settings: SceneSettings,
    ready: AtomicBool,
}

impl BoxScene {
    /// A scene that reports not ready until `mark_ready` is called.
    pub fn new(settings: SceneSettings) -> Self {
        Self {
            settings,
            ready: AtomicBool::new(false),
        }
    }

    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::Release);
    }

    pub fn start(&self) -> Vec3 {
        self.settings.start
    }

    /// Uniform point inside the box.
    pub fn random_point(&self, rng: &mut impl Rng) -> Vec3 {
        let (min, max) = (self.settings.min, self.settings.max);
        Vec3::new(
            rng.gen_range(min.x..=max.x),
            rng.gen_range(min.y..=max.y),
            rng.gen_range(min.z..=max.z),
        )
    }

    /// Whether the segment `a -> b` misses every obstacle.
    pub fn segment_clear(&self, a: Vec3, b: Vec3) -> bool {
        self.settings
            .obstacles
            .iter()
            .all(|&(center, radius)| segment_distance(a, b, center) > radius)
    }
}

/// Distance from `p` to the closest point of segment `a -> b`.
fn segment_distance(a: Vec3, b: Vec3, p: Vec3) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f32::EPSILON {
        return a.distance(p);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    (a + ab * t).distance(p)
}

impl GoalSpace for BoxScene {
    type State = Vec3;

    fn satisfies_bounds(&self, state: &Vec3) -> bool {
        state.cmpge(self.settings.min).all() && state.cmple(self.settings.max).all()
    }

    fn is_valid(&self, state: &Vec3) -> bool {
        self.settings
            .obstacles
            .iter()
            .all(|&(center, radius)| state.distance(center) > radius)
    }

    fn distance(&self, a: &Vec3, b: &Vec3) -> f64 {
        f64::from(a.distance(*b))
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }
}
