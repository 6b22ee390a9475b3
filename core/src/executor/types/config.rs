use uuid::Uuid;

use crate::config::ExecutionConfig;

/// Options for one executor run.
#[derive(Debug, Clone)]
pub struct ExecutionOpts {
    /// Identifies the build in render events and logs.
    pub build_id: String,

    /// Worker lease pool size (at least 1)
    pub max_workers: usize,

    /// Cancel the build at the first task failure
    pub fail_fast: bool,

    /// Enable visual progress bar (disabled for jsonl output)
    pub progress_bar: bool,
}

impl Default for ExecutionOpts {
    fn default() -> Self {
        Self::from_config(&ExecutionConfig::default())
    }
}

impl ExecutionOpts {
    pub fn from_config(config: &ExecutionConfig) -> Self {
        Self {
            build_id: Uuid::new_v4().to_string(),
            max_workers: config.worker_count(),
            fail_fast: config.fail_fast,
            progress_bar: config.progress_bar,
        }
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config() {
        let config = ExecutionConfig {
            max_workers: Some(3),
            fail_fast: true,
            ..Default::default()
        };
        let opts = ExecutionOpts::from_config(&config);
        assert_eq!(opts.max_workers, 3);
        assert!(opts.fail_fast);
        assert!(!opts.progress_bar);
        assert!(Uuid::parse_str(&opts.build_id).is_ok());
    }

    #[test]
    fn test_each_build_gets_new_id() {
        assert_ne!(
            ExecutionOpts::default().build_id,
            ExecutionOpts::default().build_id
        );
        assert_eq!(ExecutionOpts::default().with_max_workers(0).max_workers, 1);
    }
}
