// Bounded-concurrency, self-feeding task queue

use super::task::Task;
use super::EngineError;
use rayon::ThreadPoolBuilder;
use std::collections::{HashMap, HashSet, VecDeque};
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::channel;
use tracing::{debug, trace};

/// Work prepared on the sequencing thread and run on a worker
pub type Job<'a, T> = Box<dyn FnOnce() -> T + Send + 'a>;

/// The side of the engine that owns shared state.
///
/// `prepare` and `apply` always run on the scheduler's own thread; only the
/// returned [`Job`] may run elsewhere, so it must capture snapshots rather
/// than borrow the handler.
pub trait TaskHandler<'a> {
    type Output: Send + 'a;

    /// Whether the task's module still exists
    fn is_live(&self, task: &Task) -> bool;

    fn prepare(&self, task: &Task) -> Job<'a, Self::Output>;

    /// Apply a finished job and return the tasks it invalidates
    fn apply(&mut self, task: &Task, output: Self::Output) -> Result<Vec<Task>, EngineError>;
}

/// Counters describing one scheduler run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Jobs that ran to completion
    pub executed: usize,
    /// Tasks dropped because their module was gone, before or after running
    pub discarded: usize,
    /// Enqueues merged into an already-queued task for the same module
    pub coalesced: usize,
    /// Enqueues held back while a task for the same module was running
    pub deferred: usize,
}

impl SchedulerStats {
    /// Add the counters of a later run
    pub fn merge(&mut self, other: SchedulerStats) {
        self.executed += other.executed;
        self.discarded += other.discarded;
        self.coalesced += other.coalesced;
        self.deferred += other.deferred;
    }
}

/// Runs tasks until the queue is empty and nothing is in flight.
///
/// At most `concurrency` jobs run at once; `0` or `1` runs every job inline
/// on the calling thread. A module never has two jobs in flight: a task
/// enqueued for a running module is parked and released once the running
/// task has been applied.
pub struct TaskScheduler {
    concurrency: usize,
    queue: VecDeque<Task>,
    queued: HashSet<String>,
    in_flight: HashSet<String>,
    parked: HashMap<String, Task>,
    stats: SchedulerStats,
}

impl TaskScheduler {
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
            queue: VecDeque::new(),
            queued: HashSet::new(),
            in_flight: HashSet::new(),
            parked: HashMap::new(),
            stats: SchedulerStats::default(),
        }
    }

    pub fn with_tasks(concurrency: usize, tasks: impl IntoIterator<Item = Task>) -> Self {
        let mut scheduler = Self::new(concurrency);
        for task in tasks {
            scheduler.push(task);
        }
        scheduler
    }

    /// Enqueue a task, coalescing with a queued or running task for the same module
    pub fn push(&mut self, task: Task) {
        if self.in_flight.contains(&task.path) {
            trace!("Parking {} until its running task completes", task.path);
            self.stats.deferred += 1;
            self.parked.insert(task.path.clone(), task);
        } else if self.queued.contains(&task.path) {
            self.stats.coalesced += 1;
        } else {
            self.queued.insert(task.path.clone());
            self.queue.push_back(task);
        }
    }

    /// Drive the queue to its fixpoint
    pub fn run<'a, H>(mut self, handler: &mut H) -> Result<SchedulerStats, EngineError>
    where
        H: TaskHandler<'a>,
    {
        debug!(
            "Scheduling {} tasks with concurrency {}",
            self.queue.len(),
            self.concurrency
        );

        if self.concurrency == 1 {
            self.run_inline(handler)?;
        } else {
            self.run_pooled(handler)?;
        }

        debug!("Scheduler reached fixpoint: {:?}", self.stats);
        Ok(self.stats)
    }

    fn run_inline<'a, H: TaskHandler<'a>>(&mut self, handler: &mut H) -> Result<(), EngineError> {
        while let Some(task) = self.next_task(handler) {
            let output = (handler.prepare(&task))();
            self.complete(handler, task, output)?;
        }
        Ok(())
    }

    fn run_pooled<'a, H: TaskHandler<'a>>(&mut self, handler: &mut H) -> Result<(), EngineError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(self.concurrency)
            .thread_name(|i| format!("deadexport-worker-{}", i))
            .build()?;
        let (sender, receiver) = channel::<(Task, std::thread::Result<H::Output>)>();

        pool.in_place_scope(|scope| {
            loop {
                while self.in_flight.len() < self.concurrency {
                    let Some(task) = self.next_task(handler) else {
                        break;
                    };
                    self.in_flight.insert(task.path.clone());
                    let job = handler.prepare(&task);
                    let sender = sender.clone();
                    scope.spawn(move |_| {
                        let output = panic::catch_unwind(AssertUnwindSafe(job));
                        // The receiver outlives the scope, so this only fails
                        // if the sequencing side has already bailed out.
                        let _ = sender.send((task, output));
                    });
                }

                if self.in_flight.is_empty() {
                    return Ok(());
                }

                let (task, output) = receiver.recv().map_err(|_| EngineError::WorkerLost)?;
                self.in_flight.remove(&task.path);
                let output = output.map_err(|_| EngineError::WorkerPanicked(task.path.clone()))?;
                self.complete(handler, task, output)?;
            }
        })
    }

    /// Pop the next task whose module still exists
    fn next_task<'a, H: TaskHandler<'a>>(&mut self, handler: &H) -> Option<Task> {
        while let Some(task) = self.queue.pop_front() {
            self.queued.remove(&task.path);
            if !handler.is_live(&task) {
                trace!("Discarding task for removed module {}", task.path);
                self.stats.discarded += 1;
                continue;
            }
            return Some(task);
        }
        None
    }

    fn complete<'a, H: TaskHandler<'a>>(
        &mut self,
        handler: &mut H,
        task: Task,
        output: H::Output,
    ) -> Result<(), EngineError> {
        self.stats.executed += 1;

        if handler.is_live(&task) {
            for next in handler.apply(&task, output)? {
                self.push(next);
            }
        } else {
            trace!("Module {} vanished while being analyzed", task.path);
            self.stats.discarded += 1;
        }

        if let Some(parked) = self.parked.remove(&task.path) {
            self.push(parked);
        }
        Ok(())
    }
}
