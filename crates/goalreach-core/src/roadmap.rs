use std::time::Duration;

/// An externally owned connectivity structure that can be grown incrementally.
///
/// The sampler never reads the roadmap's contents; it only asks it to grow and,
/// on shutdown, how large it became. Implementors handle their own interior
/// synchronization since the planner may query the roadmap concurrently.
pub trait Roadmap: Send + Sync + 'static {
    /// Spend roughly `budget` extending the roadmap.
    fn grow(&self, budget: Duration);

    /// Number of nodes (milestones) currently in the roadmap.
    fn milestone_count(&self) -> usize;

    /// Number of edges currently in the roadmap.
    fn edge_count(&self) -> usize;
}
