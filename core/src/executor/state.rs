use std::fmt;
use std::sync::Mutex;

use serde::Serialize;

use crate::error::ExecutorError;

/// Per-task lifecycle state within one build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Unscheduled,
    Scheduled,
    Executing,
    Succeeded,
    Failed,
    Skipped,
    Cancelled,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Succeeded | Self::Failed | Self::Skipped | Self::Cancelled
        )
    }

    pub fn can_transition_to(self, to: TaskState) -> bool {
        use TaskState::*;
        matches!(
            (self, to),
            (Unscheduled, Scheduled)
                | (Scheduled, Executing)
                | (Executing, Succeeded)
                | (Executing, Failed)
                | (Unscheduled | Scheduled, Cancelled | Skipped)
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Unscheduled => "UNSCHEDULED",
            Self::Scheduled => "SCHEDULED",
            Self::Executing => "EXECUTING",
            Self::Succeeded => "SUCCESS",
            Self::Failed => "FAILED",
            Self::Skipped => "SKIPPED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// States of every node of a graph, indexed like the graph's nodes.
///
/// Shared between the dispatch loop and the task workers; every write goes through
/// [`StateTable::transition`].
#[derive(Debug)]
pub(crate) struct StateTable {
    states: Mutex<Vec<TaskState>>,
}

impl StateTable {
    pub(crate) fn new(len: usize) -> Self {
        Self {
            states: Mutex::new(vec![TaskState::Unscheduled; len]),
        }
    }

    pub(crate) fn get(&self, idx: usize) -> TaskState {
        self.lock()
            .get(idx)
            .copied()
            .unwrap_or(TaskState::Unscheduled)
    }

    pub(crate) fn snapshot(&self) -> Vec<TaskState> {
        self.lock().clone()
    }

    /// Applies `to` and returns the previous state.
    pub(crate) fn transition(
        &self,
        idx: usize,
        task: &dyn fmt::Display,
        to: TaskState,
    ) -> Result<TaskState, ExecutorError> {
        let mut states = self.lock();
        let slot = states
            .get_mut(idx)
            .ok_or_else(|| ExecutorError::UnknownNode(task.to_string()))?;
        let from = *slot;
        if !from.can_transition_to(to) {
            return Err(ExecutorError::InvalidTransition {
                task: task.to_string(),
                from,
                to,
            });
        }
        *slot = to;
        tracing::debug!(task = %task, ?from, ?to, "task state");
        Ok(from)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<TaskState>> {
        self.states.lock().unwrap_or_else(|e| e.into_inner())
    }
}
