use serde::Serialize;

use crate::error::{BuildError, TaskFailure};
use crate::executor::{CancelReason, TaskGraph, TaskState};
use crate::project::TaskPath;

/// Terminal state of a single task
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskOutcome {
    pub path: TaskPath,
    pub state: TaskState,

    /// Execution duration in milliseconds; absent for tasks that never executed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,

    /// Error message (if the task failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of running (or dry-running) a task graph
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub build_id: String,

    /// One entry per graph node, in plan order
    pub tasks: Vec<TaskOutcome>,

    /// Every task failure, in completion order
    pub failures: Vec<TaskFailure>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel_reason: Option<CancelReason>,

    pub dry_run: bool,

    /// Total execution duration in milliseconds
    pub duration_ms: u64,

    /// Highest number of tasks executing at once
    pub peak_concurrency: usize,

    /// Excluded tasks that ran anyway because others depend on them
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub retained_exclusions: Vec<TaskPath>,
}

impl BuildReport {
    /// Every planned task reported as skipped; nothing executes.
    pub fn dry_run(graph: &TaskGraph, build_id: impl Into<String>) -> Self {
        Self {
            build_id: build_id.into(),
            tasks: graph
                .plan_paths()
                .into_iter()
                .map(|path| TaskOutcome {
                    path: path.clone(),
                    state: TaskState::Skipped,
                    duration_ms: None,
                    error: None,
                })
                .collect(),
            failures: Vec::new(),
            cancel_reason: None,
            dry_run: true,
            duration_ms: 0,
            peak_concurrency: 0,
            retained_exclusions: graph.retained_exclusions().to_vec(),
        }
    }

    pub fn state_of(&self, path: &TaskPath) -> Option<TaskState> {
        self.tasks.iter().find(|t| &t.path == path).map(|t| t.state)
    }

    pub fn count(&self, state: TaskState) -> usize {
        self.tasks.iter().filter(|t| t.state == state).count()
    }

    pub fn paths_in(&self, state: TaskState) -> Vec<&TaskPath> {
        self.tasks
            .iter()
            .filter(|t| t.state == state)
            .map(|t| &t.path)
            .collect()
    }

    pub fn cancelled(&self) -> bool {
        self.cancel_reason.is_some()
    }

    /// No task failed and none was cancelled.
    pub fn is_success(&self) -> bool {
        !self
            .tasks
            .iter()
            .any(|t| matches!(t.state, TaskState::Failed | TaskState::Cancelled))
    }

    /// `Ok` on success; otherwise the build error carrying every failure.
    ///
    /// Interrupted builds report `Cancelled` even when some tasks failed first;
    /// a fail-fast stop reports the failures.
    pub fn into_result(self) -> Result<Self, BuildError> {
        if self.is_success() {
            return Ok(self);
        }
        let interrupted = matches!(
            self.cancel_reason,
            Some(CancelReason::Requested | CancelReason::Custom(_))
        ) && self.count(TaskState::Cancelled) > 0;

        if interrupted || self.failures.is_empty() {
            Err(BuildError::Cancelled {
                failures: self.failures,
            })
        } else {
            Err(BuildError::TaskFailures(self.failures))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(path: &str, state: TaskState) -> TaskOutcome {
        TaskOutcome {
            path: TaskPath::parse(path).unwrap(),
            state,
            duration_ms: None,
            error: None,
        }
    }

    fn report(tasks: Vec<TaskOutcome>, reason: Option<CancelReason>) -> BuildReport {
        let failures = tasks
            .iter()
            .filter(|t| t.state == TaskState::Failed)
            .map(|t| TaskFailure {
                path: t.path.clone(),
                message: "boom".to_string(),
            })
            .collect();
        BuildReport {
            build_id: "b".to_string(),
            tasks,
            failures,
            cancel_reason: reason,
            dry_run: false,
            duration_ms: 1,
            peak_concurrency: 1,
            retained_exclusions: Vec::new(),
        }
    }

    #[test]
    fn test_success_when_only_succeeded_or_skipped() {
        let r = report(
            vec![
                outcome(":a", TaskState::Succeeded),
                outcome(":b", TaskState::Skipped),
            ],
            None,
        );
        assert!(r.is_success());
        assert!(r.into_result().is_ok());
    }

    #[test]
    fn test_failures_become_task_failures() {
        let r = report(
            vec![
                outcome(":a", TaskState::Failed),
                outcome(":b", TaskState::Cancelled),
            ],
            Some(CancelReason::FailFast),
        );
        let err = r.into_result().unwrap_err();
        assert!(matches!(err, BuildError::TaskFailures(ref f) if f.len() == 1));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_interrupt_becomes_cancelled() {
        let r = report(
            vec![
                outcome(":a", TaskState::Succeeded),
                outcome(":b", TaskState::Cancelled),
            ],
            Some(CancelReason::Requested),
        );
        assert!(r.cancelled());
        let err = r.into_result().unwrap_err();
        assert_eq!(err.exit_code(), 130);
    }

    #[test]
    fn test_serializes_snake_case_states() {
        let r = report(vec![outcome(":lib:jar", TaskState::Succeeded)], None);
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["tasks"][0]["path"], ":lib:jar");
        assert_eq!(json["tasks"][0]["state"], "succeeded");
        assert!(json.get("cancel_reason").is_none());
    }
}
