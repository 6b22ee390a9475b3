//! Build configuration: turns a [`BuildRequest`] into a validated [`TaskSelection`].
//!
//! ```text
//! BuildRequest
//!   ↓
//! ExcludedTaskFilteringAction   (resolves -x, filters the final selection)
//!   ↓
//! DefaultTasksAction            (only when nothing was requested)
//!   ↓
//! TaskNameResolvingAction       (names/paths -> task paths + options)
//!   ↓
//! TaskSelection
//! ```
//!
//! Each stage receives the remainder of the chain as [`Next`] and decides whether to
//! continue it, the same shape as an HTTP middleware stack.

mod default_tasks;
mod excluded;
mod name_resolving;

use std::collections::BTreeSet;

use crate::config::SelectorMode;
use crate::error::SelectionError;
use crate::project::{ProjectModel, ProjectPath, TaskPath};
use crate::selection::{CommandLineTaskParser, TaskArg, TaskInvocation, TaskSelector};

pub use default_tasks::DefaultTasksAction;
pub use excluded::ExcludedTaskFilteringAction;
pub use name_resolving::TaskNameResolvingAction;

/// What the user asked for. Never mutated by the pipeline.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    pub tasks: Vec<TaskInvocation>,
    pub excluded: Vec<String>,
    pub use_default_tasks: bool,
    pub dry_run: bool,
    pub start_project: ProjectPath,
}

impl Default for BuildRequest {
    fn default() -> Self {
        Self {
            tasks: Vec::new(),
            excluded: Vec::new(),
            use_default_tasks: true,
            dry_run: false,
            start_project: ProjectPath::root(),
        }
    }
}

impl BuildRequest {
    /// Builds a request from raw task arguments such as `["test", "--rerun", "build"]`.
    pub fn from_args<I, S>(tokens: I) -> Result<Self, SelectionError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self {
            tasks: CommandLineTaskParser::parse(tokens)?,
            ..Default::default()
        })
    }

    /// Requests tasks by name without options.
    pub fn tasks<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tasks: names
                .into_iter()
                .map(|n| TaskInvocation::new(n.into()))
                .collect(),
            ..Default::default()
        }
    }

    pub fn exclude(mut self, task: impl Into<String>) -> Self {
        self.excluded.push(task.into());
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn use_default_tasks(mut self, enabled: bool) -> Self {
        self.use_default_tasks = enabled;
        self
    }

    pub fn start_project(mut self, project: ProjectPath) -> Self {
        self.start_project = project;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedTask {
    pub path: TaskPath,
    pub args: Vec<TaskArg>,
}

/// Concrete, deduplicated tasks to run, in request order, plus the resolved exclusions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskSelection {
    pub tasks: Vec<SelectedTask>,
    pub excluded: BTreeSet<TaskPath>,
}

impl TaskSelection {
    pub fn paths(&self) -> impl Iterator<Item = &TaskPath> {
        self.tasks.iter().map(|t| &t.path)
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Working state threaded through the stages. Derived from the request, never written back.
pub struct ConfigurationContext<'a> {
    pub request: &'a BuildRequest,
    pub selector: TaskSelector<'a>,
    /// Invocations still to resolve; the default-tasks stage may fill this in.
    pub requested: Vec<TaskInvocation>,
    pub excluded: BTreeSet<TaskPath>,
    pub selected: Vec<SelectedTask>,
}

impl<'a> ConfigurationContext<'a> {
    pub fn new(request: &'a BuildRequest, selector: TaskSelector<'a>) -> Self {
        Self {
            request,
            selector,
            requested: request.tasks.clone(),
            excluded: BTreeSet::new(),
            selected: Vec::new(),
        }
    }

    pub fn start_project(&self) -> &ProjectPath {
        &self.request.start_project
    }

    fn into_selection(self) -> TaskSelection {
        TaskSelection {
            tasks: self.selected,
            excluded: self.excluded,
        }
    }
}

/// One stage of the configuration chain.
pub trait BuildConfigurationAction: Send + Sync {
    fn name(&self) -> &'static str;

    /// Either finishes the selection or hands over with `next.proceed(ctx)`.
    fn configure(
        &self,
        ctx: &mut ConfigurationContext<'_>,
        next: Next<'_>,
    ) -> Result<(), SelectionError>;
}

/// The stages after the current one.
pub struct Next<'c> {
    rest: &'c [Box<dyn BuildConfigurationAction>],
}

impl Next<'_> {
    pub fn proceed(self, ctx: &mut ConfigurationContext<'_>) -> Result<(), SelectionError> {
        match self.rest.split_first() {
            Some((action, rest)) => {
                tracing::debug!(stage = action.name(), "configure");
                action.configure(ctx, Next { rest })
            }
            None => Ok(()),
        }
    }
}

/// Runs the fixed configuration chain.
pub struct BuildConfigurationActionExecuter {
    actions: Vec<Box<dyn BuildConfigurationAction>>,
}

impl Default for BuildConfigurationActionExecuter {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildConfigurationActionExecuter {
    pub fn new() -> Self {
        Self {
            actions: vec![
                Box::new(ExcludedTaskFilteringAction),
                Box::new(DefaultTasksAction),
                Box::new(TaskNameResolvingAction),
            ],
        }
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.actions.iter().map(|a| a.name()).collect()
    }

    pub fn select(
        &self,
        model: &ProjectModel,
        mode: SelectorMode,
        request: &BuildRequest,
    ) -> Result<TaskSelection, SelectionError> {
        let selector = TaskSelector::new(model, mode);
        selector.start_project(&request.start_project)?;
        let mut ctx = ConfigurationContext::new(request, selector);
        Next {
            rest: &self.actions,
        }
        .proceed(&mut ctx)?;
        Ok(ctx.into_selection())
    }
}
