use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ExecutorError;
use crate::executor::{
    BuildCancellationToken, BuildReport, ExecutionListener, ExecutionOpts, OutputRendererPlugin,
    RenderEvent, ResourceLockCoordinator, TaskGraph, TaskGraphExecutor,
};

/// Everything needed to execute one planned build.
#[derive(Clone)]
pub struct BuildExecutionContext {
    pub graph: Arc<TaskGraph>,
    pub dry_run: bool,
    pub opts: ExecutionOpts,
    pub cancel: BuildCancellationToken,
    pub renderer: Option<Arc<dyn OutputRendererPlugin>>,
    pub listeners: Vec<Arc<dyn ExecutionListener>>,
    pub locks: ResourceLockCoordinator,
}

impl BuildExecutionContext {
    fn emit(&self, event: RenderEvent) {
        if let Some(renderer) = &self.renderer {
            renderer.render(&event);
        }
    }
}

/// One step of the build execution chain.
#[async_trait]
pub trait BuildExecutionAction: Send + Sync {
    fn name(&self) -> &'static str;

    /// `Ok(None)` hands the build to the next action.
    async fn execute(
        &self,
        ctx: &BuildExecutionContext,
    ) -> Result<Option<BuildReport>, ExecutorError>;
}

/// Renders the plan and reports every task as skipped without executing anything.
pub struct DryRunBuildExecutionAction;

#[async_trait]
impl BuildExecutionAction for DryRunBuildExecutionAction {
    fn name(&self) -> &'static str {
        "dry-run"
    }

    async fn execute(
        &self,
        ctx: &BuildExecutionContext,
    ) -> Result<Option<BuildReport>, ExecutorError> {
        if !ctx.dry_run {
            return Ok(None);
        }
        let build_id = ctx.opts.build_id.clone();
        tracing::info!(build_id = %build_id, tasks = ctx.graph.len(), "dry run");

        ctx.emit(RenderEvent::BuildStart {
            build_id: build_id.clone(),
            total_tasks: ctx.graph.len(),
            dry_run: true,
        });
        ctx.emit(RenderEvent::Plan {
            build_id: build_id.clone(),
            stages: ctx.graph.stage_paths(),
            dry_run: true,
        });
        let report = BuildReport::dry_run(&ctx.graph, build_id.clone());
        ctx.emit(RenderEvent::BuildEnd {
            build_id,
            report: report.clone(),
        });
        Ok(Some(report))
    }
}

/// Runs the task graph executor.
pub struct SelectedTaskExecutionAction;

#[async_trait]
impl BuildExecutionAction for SelectedTaskExecutionAction {
    fn name(&self) -> &'static str {
        "selected-tasks"
    }

    async fn execute(
        &self,
        ctx: &BuildExecutionContext,
    ) -> Result<Option<BuildReport>, ExecutorError> {
        let mut executor = TaskGraphExecutor::new(Arc::clone(&ctx.graph), ctx.opts.clone())
            .with_listeners(ctx.listeners.iter().cloned())
            .with_lock_coordinator(ctx.locks.clone());
        if let Some(renderer) = &ctx.renderer {
            executor = executor.with_renderer(Arc::clone(renderer));
        }
        executor.execute(ctx.cancel.clone()).await.map(Some)
    }
}

/// The fixed chain: dry run first, then real execution.
pub struct BuildExecuter {
    actions: Vec<Box<dyn BuildExecutionAction>>,
}

impl Default for BuildExecuter {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildExecuter {
    pub fn new() -> Self {
        Self {
            actions: vec![
                Box::new(DryRunBuildExecutionAction),
                Box::new(SelectedTaskExecutionAction),
            ],
        }
    }

    pub fn action_names(&self) -> Vec<&'static str> {
        self.actions.iter().map(|a| a.name()).collect()
    }

    pub async fn execute(&self, ctx: &BuildExecutionContext) -> Result<BuildReport, ExecutorError> {
        for action in &self.actions {
            if let Some(report) = action.execute(ctx).await? {
                tracing::debug!(action = action.name(), "build executed");
                return Ok(report);
            }
        }
        Err(ExecutorError::NoExecutionAction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::config::ExclusionPolicy;
    use crate::configuration::{SelectedTask, TaskSelection};
    use crate::executor::TaskState;
    use crate::project::{FnAction, ProjectModel, Task, TaskPath};

    fn context(counter: Arc<AtomicUsize>, dry_run: bool) -> BuildExecutionContext {
        let action = FnAction::new("count", move |_ctx| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });
        let model = ProjectModel::builder("demo")
            .task(
                Task::builder(TaskPath::parse(":a").unwrap())
                    .action(Arc::new(action))
                    .build(),
            )
            .unwrap()
            .build();
        let selection = TaskSelection {
            tasks: vec![SelectedTask {
                path: TaskPath::parse(":a").unwrap(),
                args: Vec::new(),
            }],
            excluded: BTreeSet::new(),
        };
        BuildExecutionContext {
            graph: Arc::new(TaskGraph::build(&model, &selection, ExclusionPolicy::Retain).unwrap()),
            dry_run,
            opts: ExecutionOpts::default(),
            cancel: BuildCancellationToken::new(),
            renderer: None,
            listeners: Vec::new(),
            locks: ResourceLockCoordinator::new(),
        }
    }

    #[test]
    fn test_action_order() {
        assert_eq!(
            BuildExecuter::new().action_names(),
            vec!["dry-run", "selected-tasks"]
        );
    }

    #[tokio::test]
    async fn test_dry_run_never_executes() {
        let counter = Arc::new(AtomicUsize::new(0));
        let report = BuildExecuter::new()
            .execute(&context(Arc::clone(&counter), true))
            .await
            .unwrap();

        assert!(report.dry_run);
        assert_eq!(report.count(TaskState::Skipped), 1);
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_real_run_executes() {
        let counter = Arc::new(AtomicUsize::new(0));
        let report = BuildExecuter::new()
            .execute(&context(Arc::clone(&counter), false))
            .await
            .unwrap();

        assert!(!report.dry_run);
        assert_eq!(report.count(TaskState::Succeeded), 1);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
