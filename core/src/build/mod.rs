//! One build invocation end to end: configuration pipeline, task graph, build executer.

mod executer;

use std::sync::Arc;

pub use executer::{
    BuildExecuter, BuildExecutionAction, BuildExecutionContext, DryRunBuildExecutionAction,
    SelectedTaskExecutionAction,
};

use crate::config::ExecutionConfig;
use crate::configuration::{BuildConfigurationActionExecuter, BuildRequest, TaskSelection};
use crate::error::{BuildError, SelectionError};
use crate::executor::{
    BuildCancellationToken, BuildReport, ExecutionListener, ExecutionOpts, OutputRendererPlugin,
    ResourceLockCoordinator, TaskGraph,
};
use crate::project::ProjectModel;

/// Runs build requests against one project model.
///
/// Selection and graph errors are returned before anything executes. Task failures are
/// part of the returned [`BuildReport`]; use [`BuildReport::into_result`] to turn an
/// unsuccessful report into a [`BuildError`].
pub struct BuildSession {
    model: Arc<ProjectModel>,
    config: ExecutionConfig,
    configuration: BuildConfigurationActionExecuter,
    executer: BuildExecuter,
    renderer: Option<Arc<dyn OutputRendererPlugin>>,
    listeners: Vec<Arc<dyn ExecutionListener>>,
    locks: ResourceLockCoordinator,
}

impl BuildSession {
    pub fn new(model: Arc<ProjectModel>, config: ExecutionConfig) -> Self {
        Self {
            model,
            config,
            configuration: BuildConfigurationActionExecuter::new(),
            executer: BuildExecuter::new(),
            renderer: None,
            listeners: Vec::new(),
            locks: ResourceLockCoordinator::new(),
        }
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn OutputRendererPlugin>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn with_listener(mut self, listener: Arc<dyn ExecutionListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn model(&self) -> &ProjectModel {
        &self.model
    }

    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    pub fn select(&self, request: &BuildRequest) -> Result<TaskSelection, SelectionError> {
        self.configuration
            .select(&self.model, self.config.selector_mode, request)
    }

    /// Selection plus graph, without executing.
    pub fn plan(&self, request: &BuildRequest) -> Result<TaskGraph, BuildError> {
        let selection = self.select(request)?;
        let graph = TaskGraph::build(&self.model, &selection, self.config.exclusion_policy)?;
        tracing::debug!(
            selected = selection.tasks.len(),
            planned = graph.len(),
            stages = graph.stages().len(),
            "build planned"
        );
        Ok(graph)
    }

    #[tracing::instrument(name = "build", skip_all, fields(dry_run = request.dry_run))]
    pub async fn run(
        &self,
        request: &BuildRequest,
        cancel: BuildCancellationToken,
    ) -> Result<BuildReport, BuildError> {
        let graph = Arc::new(self.plan(request)?);
        let ctx = BuildExecutionContext {
            graph,
            dry_run: request.dry_run,
            opts: ExecutionOpts::from_config(&self.config),
            cancel,
            renderer: self.renderer.clone(),
            listeners: self.listeners.clone(),
            locks: self.locks.clone(),
        };
        Ok(self.executer.execute(&ctx).await?)
    }
}
