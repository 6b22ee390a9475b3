use crate::error::SelectionError;
use crate::project::{Project, PATH_SEPARATOR};
use crate::selection::TaskInvocation;

use super::{BuildConfigurationAction, ConfigurationContext, Next};

/// Substitutes default tasks when the request names none.
pub struct DefaultTasksAction;

impl BuildConfigurationAction for DefaultTasksAction {
    fn name(&self) -> &'static str {
        "default-tasks"
    }

    fn configure(
        &self,
        ctx: &mut ConfigurationContext<'_>,
        next: Next<'_>,
    ) -> Result<(), SelectionError> {
        if ctx.requested.is_empty() {
            if ctx.request.use_default_tasks {
                let start = ctx.selector.start_project(ctx.start_project())?;
                ctx.requested = default_tasks(start);
                tracing::debug!(count = ctx.requested.len(), "using default tasks");
            }
            if ctx.requested.is_empty() {
                return Err(SelectionError::NoTasksRequested);
            }
        }
        next.proceed(ctx)
    }
}

/// The start project's own defaults as bare names; failing that, the defaults of the
/// nearest descendants that declare any, qualified with their project path.
fn default_tasks(start: &Project) -> Vec<TaskInvocation> {
    if !start.default_tasks().is_empty() {
        return start
            .default_tasks()
            .iter()
            .map(TaskInvocation::new)
            .collect();
    }
    let mut out = Vec::new();
    for child in start.children() {
        collect_qualified(child, &mut out);
    }
    out
}

fn collect_qualified(project: &Project, out: &mut Vec<TaskInvocation>) {
    if project.default_tasks().is_empty() {
        for child in project.children() {
            collect_qualified(child, out);
        }
        return;
    }
    out.extend(
        project
            .default_tasks()
            .iter()
            .map(|name| TaskInvocation::new(format!("{}{PATH_SEPARATOR}{name}", project.path()))),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::{ProjectModel, ProjectPath, Task, TaskPath};
    use pretty_assertions::assert_eq;

    fn names(invocations: Vec<TaskInvocation>) -> Vec<String> {
        invocations.into_iter().map(|i| i.name).collect()
    }

    #[test]
    fn test_start_project_defaults_are_bare() {
        let model = ProjectModel::builder("demo")
            .task(Task::builder(TaskPath::parse(":build").unwrap()).build())
            .unwrap()
            .default_tasks(&ProjectPath::root(), ["build"])
            .build();
        assert_eq!(names(default_tasks(model.root())), vec!["build"]);
    }

    #[test]
    fn test_falls_back_to_nearest_children() {
        let model = ProjectModel::builder("demo")
            .default_tasks(&ProjectPath::parse(":app").unwrap(), ["check"])
            .default_tasks(&ProjectPath::parse(":lib:core").unwrap(), ["jar", "test"])
            .build();
        assert_eq!(
            names(default_tasks(model.root())),
            vec![":app:check", ":lib:core:jar", ":lib:core:test"]
        );
    }

    #[test]
    fn test_nothing_configured() {
        let model = ProjectModel::builder("demo")
            .project(&ProjectPath::parse(":app").unwrap())
            .build();
        assert!(default_tasks(model.root()).is_empty());
    }
}
