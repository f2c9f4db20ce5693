use crate::analysis::RemovedExport;

/// Lifecycle hooks around every module mutation.
///
/// Purely informational: observers cannot influence the run. For each mutated
/// module the engine calls `start` first, then `delete` or `remove_export`
/// as appropriate, then `end`.
pub trait EditObserver {
    fn start(&mut self, _path: &str, _previous: &str) {}

    fn delete(&mut self, _path: &str) {}

    fn remove_export(&mut self, _path: &str, _export: &RemovedExport) {}

    fn end(&mut self, _path: &str) {}
}

/// Observer that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl EditObserver for NoopObserver {}

impl<O: EditObserver + ?Sized> EditObserver for &mut O {
    fn start(&mut self, path: &str, previous: &str) {
        (**self).start(path, previous)
    }

    fn delete(&mut self, path: &str) {
        (**self).delete(path)
    }

    fn remove_export(&mut self, path: &str, export: &RemovedExport) {
        (**self).remove_export(path, export)
    }

    fn end(&mut self, path: &str) {
        (**self).end(path)
    }
}
