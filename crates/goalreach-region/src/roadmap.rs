//! Background roadmap growth run by the `roadmap-grower` thread.

use std::sync::Arc;
use std::time::Duration;

use goalreach_core::{GoalSpace, Roadmap};
use tracing::debug;

use crate::store::{GoalStore, Task, TaskState};

/// Summary returned when the roadmap thread is joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoadmapReport {
    /// Calls made to `Roadmap::grow`
    pub iterations: u64,
    /// Milestones in the roadmap at shutdown
    pub milestones: usize,
    /// Edges in the roadmap at shutdown
    pub edges: usize,
}

/// Body of the roadmap thread.
pub(crate) fn run<G: GoalSpace>(
    store: &Arc<GoalStore<G>>,
    roadmap: &dyn Roadmap,
    budget: Duration,
) -> RoadmapReport {
    let mut iterations = 0;
    while store.task_state(Task::RoadmapGrowth) == TaskState::Running {
        roadmap.grow(budget);
        iterations += 1;
    }

    let report = RoadmapReport {
        iterations,
        milestones: roadmap.milestone_count(),
        edges: roadmap.edge_count(),
    };
    debug!(
        "Stopped roadmap growing thread with {} nodes and {} edges",
        report.milestones, report.edges
    );
    report
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::store::tests::LineSpace;
    use crate::worker::Worker;
    use goalreach_core::RegionConfig;
    use parking_lot::Mutex;
    use std::thread;

    /// A chain roadmap: every growth step appends one node linked to the previous.
    #[derive(Default)]
    pub(crate) struct ChainRoadmap {
        pub nodes: Mutex<usize>,
        pub budgets: Mutex<Vec<Duration>>,
    }

    impl Roadmap for ChainRoadmap {
        fn grow(&self, budget: Duration) {
            *self.nodes.lock() += 1;
            let mut budgets = self.budgets.lock();
            if budgets.len() < 4 {
                budgets.push(budget);
            }
            drop(budgets);
            thread::sleep(Duration::from_millis(1));
        }

        fn milestone_count(&self) -> usize {
            *self.nodes.lock()
        }

        fn edge_count(&self) -> usize {
            self.milestone_count().saturating_sub(1)
        }
    }

    #[test]
    fn grows_until_stopped() {
        let store = Arc::new(GoalStore::new(LineSpace::ready(), RegionConfig::default()));
        let roadmap = Arc::new(ChainRoadmap::default());
        let worker = Worker::new(Task::RoadmapGrowth);

        let shared = Arc::clone(&roadmap);
        let budget = store.config().roadmap_budget();
        worker
            .start(&store, |_| {}, move |s| run(s, shared.as_ref(), budget))
            .unwrap();

        while roadmap.milestone_count() < 3 {
            thread::sleep(Duration::from_millis(1));
        }
        let report = worker.stop(&store).unwrap();

        assert!(report.iterations >= 3);
        assert_eq!(report.milestones as u64, report.iterations);
        assert_eq!(report.edges, report.milestones - 1);
        assert!(roadmap
            .budgets
            .lock()
            .iter()
            .all(|&b| b == Duration::from_millis(100)));

        let frozen = roadmap.milestone_count();
        thread::sleep(Duration::from_millis(5));
        assert_eq!(roadmap.milestone_count(), frozen);
    }
}
