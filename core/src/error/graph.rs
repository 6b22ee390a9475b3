use thiserror::Error;

/// Errors raised while building the task graph from a selection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Task '{task}' depends on unknown task '{dependency}'")]
    UnknownDependency { task: String, dependency: String },

    #[error("Circular dependency detected: {}", .0.join(" -> "))]
    CircularDependency(Vec<String>),

    #[error("Task '{excluded}' was excluded but is required by '{required_by}'")]
    ExcludedTaskRequired {
        excluded: String,
        required_by: String,
    },
}
