/// A unit of work: re-analyze one module.
///
/// The module path doubles as the cancellation token: a task whose module no
/// longer exists in the store is dropped without running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub path: String,
    /// Depth from the nearest entrypoint, `None` for modules outside the graph.
    /// Only used to order the initial queue.
    pub depth: Option<usize>,
}

impl Task {
    pub fn new(path: impl Into<String>, depth: Option<usize>) -> Self {
        Self {
            path: path.into(),
            depth,
        }
    }
}

/// Order seeded tasks by ascending depth, unreachable modules first.
///
/// Stable, so equal depths keep their path order.
pub fn sort_by_depth(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| a.depth.cmp(&b.depth));
}
