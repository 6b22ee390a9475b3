use std::future::Future;

use async_trait::async_trait;

use crate::executor::BuildCancellationToken;
use crate::selection::TaskArg;

use super::path::TaskPath;

/// What a running task can see about its own invocation.
#[derive(Debug, Clone)]
pub struct TaskContext {
    pub path: TaskPath,
    /// Task-local options given on the command line (`--tests=Foo`).
    pub args: Vec<TaskArg>,
    /// Long running actions may poll this to finish early; the executor never interrupts them.
    pub cancel: BuildCancellationToken,
}

impl TaskContext {
    pub fn arg(&self, name: &str) -> Option<&TaskArg> {
        self.args.iter().find(|a| a.name == name)
    }
}

/// The body of a task. How a task computes its outputs is entirely up to the implementation.
#[async_trait]
pub trait TaskAction: Send + Sync {
    /// Short label used in logs and plan output.
    fn describe(&self) -> String {
        "action".to_string()
    }

    async fn execute(&self, ctx: &TaskContext) -> anyhow::Result<()>;
}

/// Lifecycle tasks (`build`, `check`) only aggregate dependencies.
pub struct NoopAction;

#[async_trait]
impl TaskAction for NoopAction {
    fn describe(&self) -> String {
        "noop".to_string()
    }

    async fn execute(&self, _ctx: &TaskContext) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Adapts an async closure into a [`TaskAction`].
pub struct FnAction<F> {
    label: String,
    f: F,
}

impl<F, Fut> FnAction<F>
where
    F: Fn(TaskContext) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send,
{
    pub fn new(label: impl Into<String>, f: F) -> Self {
        Self {
            label: label.into(),
            f,
        }
    }
}

#[async_trait]
impl<F, Fut> TaskAction for FnAction<F>
where
    F: Fn(TaskContext) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send,
{
    fn describe(&self) -> String {
        self.label.clone()
    }

    async fn execute(&self, ctx: &TaskContext) -> anyhow::Result<()> {
        (self.f)(ctx.clone()).await
    }
}
