use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub execution: ExecutionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory` (or OS temp dir if unset).
    #[serde(default)]
    pub file: bool,

    /// EnvFilter string, e.g. "warn" or "kiln_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    /// Optional directory for log files. If empty or unset, uses OS temp dir.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: false,
            level: default_logging_level(),
            directory: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Worker lease pool size. Unset means one lease per available CPU.
    #[serde(default)]
    pub max_workers: Option<usize>,

    /// Stop admitting tasks as soon as one task fails.
    #[serde(default)]
    pub fail_fast: bool,

    #[serde(default)]
    pub exclusion_policy: ExclusionPolicy,

    #[serde(default)]
    pub selector_mode: SelectorMode,

    #[serde(default)]
    pub progress_bar: bool,
}

impl ExecutionConfig {
    pub fn worker_count(&self) -> usize {
        self.max_workers
            .filter(|n| *n > 0)
            .unwrap_or_else(num_cpus::get)
            .max(1)
    }
}

/// What to do when an excluded task is still a dependency of a task that runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExclusionPolicy {
    /// Keep the task in the graph and warn.
    #[default]
    Retain,
    /// Refuse to plan the build.
    Reject,
}

/// How a bare task name that exists in several projects is resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectorMode {
    /// More than one matching project is an ambiguity error.
    #[default]
    Unique,
    /// Select the task in every project that has it.
    AllProjects,
}
