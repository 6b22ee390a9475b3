use serde::Serialize;
use thiserror::Error;

use crate::executor::TaskState;
use crate::project::TaskPath;

/// Executor-internal errors. Task failures are not errors at this level; they are
/// recorded in the build report.
#[derive(Error, Debug)]
pub enum ExecutorError {
    #[error("Invalid state transition for task '{task}': {from:?} -> {to:?}")]
    InvalidTransition {
        task: String,
        from: TaskState,
        to: TaskState,
    },

    #[error("Task '{0}' is not part of the task graph")]
    UnknownNode(String),

    #[error("Worker lease pool closed unexpectedly")]
    LeasePoolClosed,

    #[error("Task worker terminated abnormally: {0}")]
    Join(String),

    #[error("No build execution action handled the build")]
    NoExecutionAction,
}

/// A task whose own work failed.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("Execution failed for task '{path}': {message}")]
pub struct TaskFailure {
    pub path: TaskPath,
    pub message: String,
}
