use thiserror::Error;

/// Errors raised while assembling the project model.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Invalid project or task path: '{0}'")]
    InvalidPath(String),

    #[error("Duplicate task: {0}")]
    DuplicateTask(String),

    #[error("Cannot read build file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid build file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Cannot create action for task '{task}': {message}")]
    Action { task: String, message: String },
}
