use thiserror::Error;

use super::{ExecutorError, GraphError, SelectionError, TaskFailure};

/// Outcome of a build invocation that did not succeed.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Executor(#[from] ExecutorError),

    #[error("Build failed with {} failure(s):{}", .0.len(), list_failures(.0))]
    TaskFailures(Vec<TaskFailure>),

    #[error("Build cancelled{}", list_failures(.failures))]
    Cancelled { failures: Vec<TaskFailure> },
}

impl BuildError {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        // 1: task failures
        // 2: request could not be planned
        // 50: internal
        // 130: cancelled (matches SIGINT convention)
        match self {
            Self::Selection(_) | Self::Graph(_) => 2,
            Self::TaskFailures(_) => 1,
            Self::Cancelled { .. } => 130,
            Self::Executor(_) => 50,
        }
    }

    pub fn failures(&self) -> &[TaskFailure] {
        match self {
            Self::TaskFailures(failures) | Self::Cancelled { failures } => failures,
            _ => &[],
        }
    }
}

fn list_failures(failures: &[TaskFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("\n  * {f}"))
        .collect::<String>()
}
