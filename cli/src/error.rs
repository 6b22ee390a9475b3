use kiln_core::api::{BuildError, ModelError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Load(#[from] ModelError),

    #[error("invalid argument: {0}")]
    Usage(String),

    #[error("logging setup failed: {0}")]
    Logging(String),

    #[error(transparent)]
    Build(#[from] BuildError),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        // 0: success
        // 1: task failures
        // 2: selection / graph / usage error
        // 11: config or build file error
        // 50: internal
        // 130: cancelled
        match self {
            Self::Config(_) | Self::Load(_) => 11,
            Self::Usage(_) => 2,
            Self::Logging(_) => 50,
            Self::Build(e) => e.exit_code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_core::api::SelectionError;

    #[test]
    fn test_exit_codes() {
        assert_eq!(CliError::Config("bad".to_string()).exit_code(), 11);
        assert_eq!(CliError::Usage("bad".to_string()).exit_code(), 2);
        let build: CliError = BuildError::from(SelectionError::NoTasksRequested).into();
        assert_eq!(build.exit_code(), 2);
        let cancelled: CliError = BuildError::Cancelled {
            failures: Vec::new(),
        }
        .into();
        assert_eq!(cancelled.exit_code(), 130);
    }
}
