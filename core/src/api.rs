//! Stable re-exports for consumers (`cli`, `plugins`, and external crates).
//!
//! Prefer importing from `kiln_core::api` instead of reaching into internal modules.

pub use crate::build::{BuildExecuter, BuildExecutionAction, BuildExecutionContext, BuildSession};
pub use crate::config::{
    get_kiln_data_dir, load_default, load_from, AppConfig, ExclusionPolicy, ExecutionConfig,
    LoggingConfig, SelectorMode,
};
pub use crate::configuration::{BuildRequest, SelectedTask, TaskSelection};
pub use crate::error::{
    BuildError, ExecutorError, GraphError, ModelError, SelectionError, TaskFailure,
};
pub use crate::executor::{
    BuildCancellationToken, BuildReport, CancelReason, ExecutionListener, ExecutionOpts,
    OutputRendererPlugin, RenderEvent, TaskGraph, TaskGraphExecutor, TaskOutcome, TaskState,
};
pub use crate::project::{
    load_project_model, parse_project_model, ActionFactory, ActionSpec, FnAction, NoopAction,
    ProjectModel, ProjectPath, ResourceId, Task, TaskAction, TaskContext, TaskPath,
    BUILD_FILE_NAME,
};
pub use crate::selection::{CommandLineTaskParser, TaskArg, TaskInvocation};
