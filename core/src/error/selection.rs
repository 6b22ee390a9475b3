use thiserror::Error;

/// Errors raised while turning a build request into a task selection.
///
/// Every one of these is fatal: no part of the plan executes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Task '{request}' not found in {scope}.{}", suggest(.suggestions))]
    UnknownTask {
        request: String,
        scope: String,
        suggestions: Vec<String>,
    },

    #[error("Task '{request}' is ambiguous in {scope}. Candidates are: {}.", .candidates.join(", "))]
    AmbiguousTask {
        request: String,
        scope: String,
        candidates: Vec<String>,
    },

    #[error("Project '{request}' not found in {scope}.{}", suggest(.suggestions))]
    UnknownProject {
        request: String,
        scope: String,
        suggestions: Vec<String>,
    },

    #[error("Project '{request}' is ambiguous in {scope}. Candidates are: {}.", .candidates.join(", "))]
    AmbiguousProject {
        request: String,
        scope: String,
        candidates: Vec<String>,
    },

    #[error("No tasks requested and no default tasks configured")]
    NoTasksRequested,

    #[error("Task option '{0}' must follow a task name")]
    TaskOptionWithoutTask(String),

    #[error("Invalid task option '{0}'")]
    InvalidTaskOption(String),
}

impl SelectionError {
    /// Candidates or suggestions offered to the user, if any.
    pub fn candidates(&self) -> &[String] {
        match self {
            Self::UnknownTask { suggestions, .. } | Self::UnknownProject { suggestions, .. } => {
                suggestions
            }
            Self::AmbiguousTask { candidates, .. } | Self::AmbiguousProject { candidates, .. } => {
                candidates
            }
            _ => &[],
        }
    }
}

fn suggest(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else {
        format!(" Did you mean: {}?", suggestions.join(", "))
    }
}
