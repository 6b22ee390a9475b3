use std::path::PathBuf;

use clap::Parser;
use kiln_core::api::{ExclusionPolicy, ExecutionConfig, SelectorMode};

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Jsonl,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Jsonl => "jsonl",
        }
    }
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExclusionPolicyArg {
    Retain,
    Reject,
}

impl From<ExclusionPolicyArg> for ExclusionPolicy {
    fn from(arg: ExclusionPolicyArg) -> Self {
        match arg {
            ExclusionPolicyArg::Retain => ExclusionPolicy::Retain,
            ExclusionPolicyArg::Reject => ExclusionPolicy::Reject,
        }
    }
}

/// Run build tasks declared in `kiln.toml`.
///
/// Options go before the first task. Everything from the first task on is read as tasks
/// and their task options, e.g. `kiln -m test --tests=Foo* build`.
#[derive(Parser, Debug)]
#[command(name = "kiln", version)]
pub struct Args {
    /// Exclude a task (name, abbreviation or path). May be repeated.
    #[arg(short = 'x', long = "exclude-task", value_name = "TASK", action = clap::ArgAction::Append)]
    pub exclude: Vec<String>,

    /// Print the tasks that would run without running them.
    #[arg(short = 'm', long)]
    pub dry_run: bool,

    /// Worker lease pool size. Defaults to the configured value, else the number of CPUs.
    #[arg(long, value_name = "N")]
    pub max_workers: Option<usize>,

    /// Stop starting new tasks after the first failure.
    #[arg(long)]
    pub fail_fast: bool,

    /// Directory containing `kiln.toml`.
    #[arg(long, value_name = "DIR")]
    pub project_dir: Option<PathBuf>,

    /// Project that bare task names are resolved from, e.g. `:app`.
    #[arg(short = 'p', long, value_name = "PATH")]
    pub start_project: Option<String>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Run a bare task name in every project that has it instead of failing as ambiguous.
    #[arg(long)]
    pub all_projects: bool,

    /// What to do when an excluded task is needed by another task.
    #[arg(long, value_enum)]
    pub exclusion_policy: Option<ExclusionPolicyArg>,

    /// Show a progress bar on stderr.
    #[arg(long)]
    pub progress: bool,

    /// Suppress per-task output; only errors are printed.
    #[arg(short, long)]
    pub quiet: bool,

    /// Tasks to run, each optionally followed by `--name[=value]` task options.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "TASKS")]
    pub tasks: Vec<String>,
}

impl Args {
    /// Command line flags take precedence over the loaded configuration.
    pub fn apply_overrides(&self, execution: &mut ExecutionConfig) {
        if let Some(n) = self.max_workers {
            execution.max_workers = Some(n);
        }
        if self.fail_fast {
            execution.fail_fast = true;
        }
        if self.all_projects {
            execution.selector_mode = SelectorMode::AllProjects;
        }
        if let Some(policy) = self.exclusion_policy {
            execution.exclusion_policy = policy.into();
        }
        if self.progress {
            execution.progress_bar = true;
        }
    }
}
