#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use kiln_core::api::{
    BuildSession, ExecutionConfig, ExecutionListener, FnAction, ProjectModel, Task, TaskAction,
    TaskFailure, TaskPath, TaskState,
};

pub fn path(raw: &str) -> TaskPath {
    TaskPath::parse(raw).unwrap()
}

/// Builds a model from `(task path, dependencies)` pairs; every task is a no-op.
pub fn model(tasks: &[(&str, &[&str])]) -> ProjectModel {
    let mut builder = ProjectModel::builder("demo");
    for (task, deps) in tasks {
        let mut task = Task::builder(path(task));
        for dep in *deps {
            task = task.depends_on(*dep);
        }
        builder = builder.task(task.build()).unwrap();
    }
    builder.build()
}

pub fn sleep_action(millis: u64) -> Arc<dyn TaskAction> {
    Arc::new(FnAction::new(format!("sleep {millis}ms"), move |_ctx| async move {
        tokio::time::sleep(Duration::from_millis(millis)).await;
        Ok(())
    }))
}

pub fn fail_action(message: &'static str) -> Arc<dyn TaskAction> {
    Arc::new(FnAction::new("fail", move |_ctx| async move {
        Err(anyhow::anyhow!(message))
    }))
}

/// Sleeps while counting how many actions sharing `inside` overlap.
pub fn overlap_counter(inside: Arc<AtomicUsize>, max_inside: Arc<AtomicUsize>) -> Arc<dyn TaskAction> {
    Arc::new(FnAction::new("overlap counter", move |_ctx| {
        let inside = Arc::clone(&inside);
        let max_inside = Arc::clone(&max_inside);
        async move {
            let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
            max_inside.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            inside.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        }
    }))
}

pub fn session(model: ProjectModel, workers: usize, fail_fast: bool) -> BuildSession {
    BuildSession::new(
        Arc::new(model),
        ExecutionConfig {
            max_workers: Some(workers),
            fail_fast,
            ..Default::default()
        },
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Start,
    End(TaskState),
}

#[derive(Default)]
struct RecorderState {
    running: usize,
    max_running: usize,
    log: Vec<(String, Event)>,
}

/// Listener that keeps an ordered log of task starts and ends.
#[derive(Default)]
pub struct Recorder {
    state: Mutex<RecorderState>,
}

impl Recorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn max_running(&self) -> usize {
        self.state.lock().unwrap().max_running
    }

    pub fn log(&self) -> Vec<(String, Event)> {
        self.state.lock().unwrap().log.clone()
    }

    pub fn started(&self) -> Vec<String> {
        self.log()
            .into_iter()
            .filter(|(_, e)| *e == Event::Start)
            .map(|(task, _)| task)
            .collect()
    }

    pub fn position(&self, task: &str, event: Event) -> Option<usize> {
        self.log()
            .iter()
            .position(|(t, e)| t == task && *e == event)
    }
}

impl ExecutionListener for Recorder {
    fn before_execute(&self, task: &TaskPath) {
        let mut state = self.state.lock().unwrap();
        state.running += 1;
        state.max_running = state.max_running.max(state.running);
        state.log.push((task.to_string(), Event::Start));
    }

    fn after_execute(&self, task: &TaskPath, outcome: TaskState, _failure: Option<&TaskFailure>) {
        let mut state = self.state.lock().unwrap();
        state.running -= 1;
        state.log.push((task.to_string(), Event::End(outcome)));
    }
}
