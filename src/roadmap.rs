//! Toy probabilistic roadmap over the box scene

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use glam::Vec3;
use goalreach_core::{GoalSpace, Roadmap};
use parking_lot::Mutex;

use crate::scene::BoxScene;

#[derive(Default)]
struct Graph {
    nodes: Vec<Vec3>,
    edges: Vec<(usize, usize)>,
}

/// Random milestones linked to every visible neighbour within `connect_radius`.
///
/// Growth stops once `max_milestones` nodes exist.
pub struct BoxRoadmap {
    scene: Arc<BoxScene>,
    connect_radius: f32,
    max_milestones: usize,
    graph: Mutex<Graph>,
}

impl BoxRoadmap {
    pub fn new(scene: Arc<BoxScene>, connect_radius: f32, max_milestones: usize) -> Self {
        Self {
            scene,
            connect_radius,
            max_milestones,
            graph: Mutex::new(Graph::default()),
        }
    }

    pub fn is_full(&self) -> bool {
        self.milestone_count() >= self.max_milestones
    }

    /// Add one milestone if valid, returning its index.
    fn add_milestone(&self, point: Vec3) -> Option<usize> {
        if !self.scene.is_valid(&point) {
            return None;
        }

        let mut graph = self.graph.lock();
        let index = graph.nodes.len();
        if index >= self.max_milestones {
            return None;
        }
        let neighbours: Vec<usize> = graph
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, other)| {
                other.distance(point) <= self.connect_radius
                    && self.scene.segment_clear(**other, point)
            })
            .map(|(i, _)| i)
            .collect();

        graph.nodes.push(point);
        graph.edges.extend(neighbours.into_iter().map(|i| (i, index)));
        Some(index)
    }
}

impl Roadmap for BoxRoadmap {
    fn grow(&self, budget: Duration) {
        if self.is_full() {
            // Nothing left to do; keep the worker from spinning.
            thread::sleep(budget);
            return;
        }
        let deadline = Instant::now() + budget;
        let mut rng = rand::thread_rng();
        loop {
            let point = self.scene.random_point(&mut rng);
            self.add_milestone(point);
            if Instant::now() >= deadline || self.is_full() {
                break;
            }
        }
    }

    fn milestone_count(&self) -> usize {
        self.graph.lock().nodes.len()
    }

    fn edge_count(&self) -> usize {
        self.graph.lock().edges.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SceneSettings;

    fn roadmap() -> BoxRoadmap {
        BoxRoadmap::new(Arc::new(BoxScene::new(SceneSettings::default())), 4.0, 64)
    }

    #[test]
    fn invalid_milestones_are_rejected() {
        let roadmap = roadmap();
        assert_eq!(roadmap.add_milestone(Vec3::new(3.0, 0.0, 0.0)), None);
        assert_eq!(roadmap.milestone_count(), 0);
    }

    #[test]
    fn visible_neighbours_are_linked() {
        let roadmap = roadmap();
        assert_eq!(roadmap.add_milestone(Vec3::new(8.0, 8.0, 8.0)), Some(0));
        assert_eq!(roadmap.add_milestone(Vec3::new(8.0, 8.0, 6.0)), Some(1));
        // Too far from both.
        assert_eq!(roadmap.add_milestone(Vec3::new(-8.0, -8.0, -8.0)), Some(2));
        assert_eq!(roadmap.milestone_count(), 3);
        assert_eq!(roadmap.edge_count(), 1);
    }

    #[test]
    fn grow_adds_at_least_one_sample() {
        let roadmap = roadmap();
        roadmap.grow(Duration::ZERO);
        roadmap.grow(Duration::from_millis(5));
        // Random points may land in obstacles, but over 5ms some will not.
        assert!(roadmap.milestone_count() > 0);
        assert!(roadmap.edge_count() <= roadmap.milestone_count() * roadmap.milestone_count());
    }

    #[test]
    fn growth_stops_at_milestone_cap() {
        let roadmap = BoxRoadmap::new(Arc::new(BoxScene::new(SceneSettings::default())), 4.0, 3);
        roadmap.grow(Duration::from_millis(20));
        assert_eq!(roadmap.milestone_count(), 3);
        assert!(roadmap.is_full());

        let started = Instant::now();
        roadmap.grow(Duration::from_millis(5));
        assert_eq!(roadmap.milestone_count(), 3);
        assert!(started.elapsed() >= Duration::from_millis(5));
        assert_eq!(roadmap.add_milestone(Vec3::new(8.0, 8.0, 8.0)), None);
    }
}
