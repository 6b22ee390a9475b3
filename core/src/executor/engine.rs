use std::any::Any;
use std::collections::BTreeSet;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use futures::FutureExt;
use tokio::task::JoinSet;

use crate::error::{ExecutorError, TaskFailure};
use crate::project::TaskContext;

use super::cancel::{BuildCancellationToken, CancelReason};
use super::graph::TaskGraph;
use super::lease::WorkerLeasePool;
use super::locks::ResourceLockCoordinator;
use super::progress::ProgressMonitor;
use super::state::{StateTable, TaskState};
use super::traits::{ExecutionListener, OutputRendererPlugin, RenderEvent};
use super::types::{BuildReport, ExecutionOpts, TaskOutcome};

/// Runs a task graph with bounded parallelism.
///
/// Dispatch is event driven: a task is spawned as soon as its last dependency
/// succeeds, then waits for a worker lease and its resource locks. Nothing polls.
pub struct TaskGraphExecutor {
    graph: Arc<TaskGraph>,
    opts: ExecutionOpts,
    renderer: Option<Arc<dyn OutputRendererPlugin>>,
    listeners: Vec<Arc<dyn ExecutionListener>>,
    locks: ResourceLockCoordinator,
}

impl TaskGraphExecutor {
    pub fn new(graph: Arc<TaskGraph>, opts: ExecutionOpts) -> Self {
        Self {
            graph,
            opts,
            renderer: None,
            listeners: Vec::new(),
            locks: ResourceLockCoordinator::new(),
        }
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn OutputRendererPlugin>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn with_listener(mut self, listener: Arc<dyn ExecutionListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn with_listeners(mut self, listeners: impl IntoIterator<Item = Arc<dyn ExecutionListener>>) -> Self {
        self.listeners.extend(listeners);
        self
    }

    /// Shares resource locks with work outside this executor.
    pub fn with_lock_coordinator(mut self, locks: ResourceLockCoordinator) -> Self {
        self.locks = locks;
        self
    }

    pub fn graph(&self) -> &TaskGraph {
        &self.graph
    }

    /// Executes every task, or as many as possible before cancellation.
    ///
    /// Task failures are recorded in the report, never returned as errors.
    pub async fn execute(&self, cancel: BuildCancellationToken) -> Result<BuildReport, ExecutorError> {
        let start = Instant::now();
        let graph = Arc::clone(&self.graph);
        let n = graph.len();
        let pool = WorkerLeasePool::new(self.opts.max_workers);

        let worker = Arc::new(Worker {
            graph: Arc::clone(&graph),
            states: StateTable::new(n),
            pool: pool.clone(),
            locks: self.locks.clone(),
            listeners: self.listeners.clone(),
            renderer: self.renderer.clone(),
            progress: Mutex::new(ProgressMonitor::new(n, self.opts.progress_bar)),
            cancel: cancel.clone(),
            build_id: self.opts.build_id.clone(),
        });

        tracing::info!(
            build_id = %self.opts.build_id,
            tasks = n,
            workers = pool.capacity(),
            "build started"
        );
        worker.emit(RenderEvent::BuildStart {
            build_id: self.opts.build_id.clone(),
            total_tasks: n,
            dry_run: false,
        });
        worker.emit(RenderEvent::Plan {
            build_id: self.opts.build_id.clone(),
            stages: graph.stage_paths(),
            dry_run: false,
        });

        let plan = graph.plan_order();
        let mut rank = vec![0; n];
        for (pos, &idx) in plan.iter().enumerate() {
            rank[idx] = pos;
        }
        let mut remaining: Vec<usize> = graph.nodes().iter().map(|node| node.dependencies.len()).collect();
        // ordered by plan position so dispatch follows the plan
        let mut ready: BTreeSet<(usize, usize)> = (0..n)
            .filter(|&idx| remaining[idx] == 0)
            .map(|idx| (rank[idx], idx))
            .collect();

        let mut durations: Vec<Option<u64>> = vec![None; n];
        let mut errors: Vec<Option<String>> = vec![None; n];
        let mut failures: Vec<TaskFailure> = Vec::new();
        let mut running: JoinSet<Result<TaskRun, ExecutorError>> = JoinSet::new();

        loop {
            if !cancel.is_cancelled() {
                while let Some((_, idx)) = ready.pop_first() {
                    worker.transition(idx, TaskState::Scheduled)?;
                    running.spawn(Arc::clone(&worker).run(idx));
                }
            }

            let Some(joined) = running.join_next().await else {
                break;
            };
            let run = joined.map_err(|e| ExecutorError::Join(e.to_string()))??;
            durations[run.idx] = run.duration_ms;
            errors[run.idx] = run.error.clone();

            match run.state {
                TaskState::Succeeded => {
                    for &dependent in graph.dependents(run.idx) {
                        remaining[dependent] -= 1;
                        if remaining[dependent] == 0
                            && worker.states.get(dependent) == TaskState::Unscheduled
                        {
                            ready.insert((rank[dependent], dependent));
                        }
                    }
                }
                TaskState::Failed => {
                    failures.push(TaskFailure {
                        path: graph.nodes()[run.idx].path.clone(),
                        message: run.error.unwrap_or_default(),
                    });
                    worker.skip_dependents(run.idx)?;
                    if self.opts.fail_fast {
                        cancel.cancel(CancelReason::FailFast);
                    }
                }
                // dependents of a cancelled task are settled below
                _ => {}
            }
        }

        for &idx in &plan {
            if worker.states.get(idx).is_terminal() {
                continue;
            }
            let blocked = graph.nodes()[idx]
                .dependencies
                .iter()
                .any(|&dep| matches!(worker.states.get(dep), TaskState::Failed | TaskState::Skipped));
            let state = if blocked {
                TaskState::Skipped
            } else {
                TaskState::Cancelled
            };
            worker.complete(idx, state, None, None)?;
        }

        let states = worker.states.snapshot();
        let tasks = plan
            .iter()
            .map(|&idx| TaskOutcome {
                path: graph.nodes()[idx].path.clone(),
                state: states[idx],
                duration_ms: durations[idx],
                error: errors[idx].clone(),
            })
            .collect();

        let report = BuildReport {
            build_id: self.opts.build_id.clone(),
            tasks,
            failures,
            cancel_reason: cancel.reason(),
            dry_run: false,
            duration_ms: start.elapsed().as_millis() as u64,
            peak_concurrency: pool.peak(),
            retained_exclusions: graph.retained_exclusions().to_vec(),
        };

        worker.progress().finish(report.is_success());
        tracing::info!(
            build_id = %report.build_id,
            success = report.is_success(),
            failed = report.failures.len(),
            duration_ms = report.duration_ms,
            "build finished"
        );
        worker.emit(RenderEvent::BuildEnd {
            build_id: report.build_id.clone(),
            report: report.clone(),
        });

        Ok(report)
    }
}

struct TaskRun {
    idx: usize,
    state: TaskState,
    duration_ms: Option<u64>,
    error: Option<String>,
}

/// Everything a spawned task needs, shared by all tasks of one build.
struct Worker {
    graph: Arc<TaskGraph>,
    states: StateTable,
    pool: WorkerLeasePool,
    locks: ResourceLockCoordinator,
    listeners: Vec<Arc<dyn ExecutionListener>>,
    renderer: Option<Arc<dyn OutputRendererPlugin>>,
    progress: Mutex<ProgressMonitor>,
    cancel: BuildCancellationToken,
    build_id: String,
}

impl Worker {
    /// Lease, then locks, then the action. Cancellation is honoured until the action starts.
    async fn run(self: Arc<Self>, idx: usize) -> Result<TaskRun, ExecutorError> {
        let graph = Arc::clone(&self.graph);
        let node = graph
            .node(idx)
            .ok_or_else(|| ExecutorError::UnknownNode(idx.to_string()))?;

        let lease = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            lease = self.pool.acquire() => Some(lease?),
        };
        let Some(lease) = lease else {
            return self.cancel_before_start(idx);
        };
        if self.cancel.is_cancelled() {
            drop(lease);
            return self.cancel_before_start(idx);
        }

        let lock = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            lock = self.locks.lock(&node.resources) => Some(lock),
        };
        let Some(lock) = lock else {
            drop(lease);
            return self.cancel_before_start(idx);
        };

        self.transition(idx, TaskState::Executing)?;
        for listener in &self.listeners {
            listener.before_execute(&node.path);
        }
        self.emit(RenderEvent::TaskStart {
            build_id: self.build_id.clone(),
            task: node.path.to_string(),
        });
        self.progress().start_task(&node.path.to_string());

        let ctx = TaskContext {
            path: node.path.clone(),
            args: node.args.clone(),
            cancel: self.cancel.clone(),
        };
        let started = Instant::now();
        let result = AssertUnwindSafe(node.action.execute(&ctx))
            .catch_unwind()
            .await;
        let duration_ms = started.elapsed().as_millis() as u64;
        drop(lock);

        let (state, error) = match result {
            Ok(Ok(())) => (TaskState::Succeeded, None),
            Ok(Err(e)) => (TaskState::Failed, Some(format!("{e:#}"))),
            Err(panic) => (TaskState::Failed, Some(panic_message(panic.as_ref()))),
        };
        if let Some(error) = &error {
            tracing::debug!(task = %node.path, %error, "task failed");
        }

        self.complete(idx, state, Some(duration_ms), error.clone())?;
        let failure = error.as_ref().map(|message| TaskFailure {
            path: node.path.clone(),
            message: message.clone(),
        });
        for listener in &self.listeners {
            listener.after_execute(&node.path, state, failure.as_ref());
        }
        drop(lease);

        Ok(TaskRun {
            idx,
            state,
            duration_ms: Some(duration_ms),
            error,
        })
    }

    fn cancel_before_start(&self, idx: usize) -> Result<TaskRun, ExecutorError> {
        self.complete(idx, TaskState::Cancelled, None, None)?;
        Ok(TaskRun {
            idx,
            state: TaskState::Cancelled,
            duration_ms: None,
            error: None,
        })
    }

    /// Marks every not-yet-scheduled transitive dependent of `idx` as skipped.
    fn skip_dependents(&self, idx: usize) -> Result<(), ExecutorError> {
        let mut stack: Vec<usize> = self.graph.dependents(idx).to_vec();
        while let Some(dependent) = stack.pop() {
            if self.states.get(dependent) != TaskState::Unscheduled {
                continue;
            }
            self.complete(dependent, TaskState::Skipped, None, None)?;
            stack.extend_from_slice(self.graph.dependents(dependent));
        }
        Ok(())
    }

    fn transition(&self, idx: usize, to: TaskState) -> Result<(), ExecutorError> {
        let path = &self
            .graph
            .node(idx)
            .ok_or_else(|| ExecutorError::UnknownNode(idx.to_string()))?
            .path;
        let from = self.states.transition(idx, path, to)?;
        for listener in &self.listeners {
            listener.on_state_change(path, from, to);
        }
        Ok(())
    }

    /// Records a terminal state and reports it.
    fn complete(
        &self,
        idx: usize,
        state: TaskState,
        duration_ms: Option<u64>,
        error: Option<String>,
    ) -> Result<(), ExecutorError> {
        self.transition(idx, state)?;
        let path = self.graph.nodes()[idx].path.clone();
        self.progress()
            .complete_task(&path.to_string(), state, duration_ms);
        self.emit(RenderEvent::TaskComplete {
            build_id: self.build_id.clone(),
            outcome: TaskOutcome {
                path,
                state,
                duration_ms,
                error,
            },
        });
        Ok(())
    }

    fn emit(&self, event: RenderEvent) {
        if let Some(renderer) = &self.renderer {
            renderer.render(&event);
        }
    }

    fn progress(&self) -> std::sync::MutexGuard<'_, ProgressMonitor> {
        self.progress.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("task panicked: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("task panicked: {s}")
    } else {
        "task panicked".to_string()
    }
}
