//! The incremental, cancelable search pipeline.
//!
//! Every keystroke submits a new query. Each query becomes a [`SearchTask`]
//! stamped with a monotonically increasing sequence number and dispatched to
//! the blocking pool, where it runs the full provider chain. Tasks finish in
//! arbitrary order; the [`SearchCoordinator`] accepts a task's results only
//! if no newer task has delivered yet, so the sink always reflects the most
//! recent accepted query regardless of completion order.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use arc_swap::ArcSwap;
use tracing::debug;

use crate::chain::evaluate_with;
use crate::item::ResultItem;
use crate::provider::Provider;

/// Consumer of accepted result sets.
///
/// `replace` is invoked at most once per accepted task, in acceptance order
/// (the coordinator serializes calls), and replaces the displayed set
/// wholesale. Implementations must not block and must not call back into the
/// coordinator.
pub trait ResultSink: Send + Sync {
    /// A new search was submitted; show a pending affordance.
    fn searching(&self) {}

    /// Replace the displayed result list.
    fn replace(&self, items: Vec<ResultItem>);
}

/// One query's journey through the provider chain.
///
/// Created at submission, runs once, never reused. The cancellation flag is
/// advisory: a task that already started provider work may run to completion
/// (external processes are not killed mid-call), but its outcome is vetoed at
/// delivery time.
pub struct SearchTask {
    query: String,
    stamp: u64,
    canceled: AtomicBool,
    finished: AtomicBool,
}

impl SearchTask {
    fn new(query: &str, stamp: u64) -> Self {
        Self {
            query: query.to_string(),
            stamp,
            canceled: AtomicBool::new(false),
            finished: AtomicBool::new(false),
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Submission sequence number; later submissions get larger stamps.
    pub fn stamp(&self) -> u64 {
        self.stamp
    }

    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::Relaxed);
    }

    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::Relaxed)
    }

    fn mark_finished(&self) {
        self.finished.store(true, Ordering::Relaxed);
    }

    fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Relaxed)
    }

    /// Execute the provider chain for this task's query.
    ///
    /// Returns `None` if the task was canceled before it produced a complete
    /// result list; canceled-before-start tasks do no provider work at all.
    pub fn run(&self, providers: &[Box<dyn Provider>]) -> Option<Vec<ResultItem>> {
        evaluate_with(providers, &self.query, || self.is_canceled())
    }
}

struct CoordinatorState {
    /// In-flight tasks in submission order. Finished tasks are pruned on
    /// every completion, so this never grows beyond the burst of queries
    /// still running.
    tasks: Vec<Arc<SearchTask>>,
    /// Stamp of the last task whose results were delivered to the sink.
    /// Monotonically non-decreasing; the single invariant that keeps stale
    /// results off the screen.
    last_accepted: u64,
}

/// Owns the in-flight task list and arbitrates which task's results reach
/// the sink.
pub struct SearchCoordinator {
    /// The provider chain, swapped wholesale on cache reset. Tasks capture a
    /// snapshot at dispatch and never observe a mid-swap state.
    chain: ArcSwap<Vec<Box<dyn Provider>>>,
    sink: Arc<dyn ResultSink>,
    state: Mutex<CoordinatorState>,
    next_stamp: AtomicU64,
}

impl SearchCoordinator {
    pub fn new(providers: Vec<Box<dyn Provider>>, sink: Arc<dyn ResultSink>) -> Self {
        Self {
            chain: ArcSwap::from_pointee(providers),
            sink,
            state: Mutex::new(CoordinatorState {
                tasks: Vec::new(),
                last_accepted: 0,
            }),
            next_stamp: AtomicU64::new(0),
        }
    }

    /// Submit a query. Fire-and-forget: safe to call on every keystroke,
    /// including the empty string to request favorites. The returned handle
    /// is for observation only and may be dropped.
    pub fn search(self: &Arc<Self>, text: &str) -> Arc<SearchTask> {
        let stamp = self.next_stamp.fetch_add(1, Ordering::Relaxed) + 1;
        let task = Arc::new(SearchTask::new(text, stamp));
        debug!("search #{stamp}: {text:?}");

        self.state
            .lock()
            .expect("coordinator state poisoned")
            .tasks
            .push(Arc::clone(&task));
        self.sink.searching();

        let chain = self.chain.load_full();
        let coordinator = Arc::clone(self);
        let worker = Arc::clone(&task);
        tokio::task::spawn_blocking(move || {
            let outcome = worker.run(&chain);
            coordinator.on_task_finished(&worker, outcome);
        });

        task
    }

    /// Called exactly once per task, from whatever thread executed it.
    ///
    /// Accepts the outcome iff the task is at least as new as the newest
    /// accepted so far, then flags every older in-flight task as canceled
    /// (pure optimization: the acceptance gate alone already guarantees
    /// their late results are discarded) and delivers to the sink. The sink
    /// call happens under the state lock so deliveries are strictly ordered
    /// by acceptance stamp.
    fn on_task_finished(&self, task: &Arc<SearchTask>, outcome: Option<Vec<ResultItem>>) {
        task.mark_finished();

        let mut state = self.state.lock().expect("coordinator state poisoned");
        let accepted = match outcome {
            Some(items) if task.stamp() >= state.last_accepted => {
                state.last_accepted = task.stamp();
                for older in &state.tasks {
                    if older.stamp() < task.stamp() {
                        older.cancel();
                    }
                }
                Some(items)
            }
            Some(_) => {
                debug!("search #{} superseded, discarding results", task.stamp());
                None
            }
            None => None,
        };

        state.tasks.retain(|t| !t.is_finished());

        if let Some(items) = accepted {
            self.sink.replace(items);
        }
    }

    /// Swap in a new provider chain. Already-running tasks keep their old
    /// snapshot; new submissions see the new chain.
    pub fn replace_chain(&self, providers: Vec<Box<dyn Provider>>) {
        self.chain.store(Arc::new(providers));
    }

    /// Number of submitted tasks that have not finished yet.
    pub fn in_flight(&self) -> usize {
        self.state
            .lock()
            .expect("coordinator state poisoned")
            .tasks
            .len()
    }
}
