use crate::error::TaskFailure;
use crate::executor::TaskState;
use crate::project::TaskPath;

/// Instrumentation hooks invoked by the executor.
///
/// Called from task workers concurrently; implementations must not block.
pub trait ExecutionListener: Send + Sync {
    /// Right before the task's action runs, with its lease and locks held.
    fn before_execute(&self, _task: &TaskPath) {}

    /// After the action returned and the terminal state was recorded.
    fn after_execute(&self, _task: &TaskPath, _state: TaskState, _failure: Option<&TaskFailure>) {}

    fn on_state_change(&self, _task: &TaskPath, _from: TaskState, _to: TaskState) {}
}
