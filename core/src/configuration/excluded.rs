use crate::config::SelectorMode;
use crate::error::SelectionError;
use crate::selection::TaskSelector;

use super::{BuildConfigurationAction, ConfigurationContext, Next};

/// Resolves `-x` arguments and keeps excluded tasks out of the selection roots.
///
/// A bare excluded name applies to every project that has the task. Whether an excluded
/// task that is still needed as a dependency runs is decided by the graph builder.
pub struct ExcludedTaskFilteringAction;

impl BuildConfigurationAction for ExcludedTaskFilteringAction {
    fn name(&self) -> &'static str {
        "excluded-tasks"
    }

    fn configure(
        &self,
        ctx: &mut ConfigurationContext<'_>,
        next: Next<'_>,
    ) -> Result<(), SelectionError> {
        let request = ctx.request;
        let selector = TaskSelector::new(ctx.selector.model(), SelectorMode::AllProjects);
        for raw in &request.excluded {
            let resolved = selector.select(&request.start_project, raw)?;
            tracing::debug!(exclude = %raw, resolved = resolved.len(), "excluding tasks");
            ctx.excluded.extend(resolved);
        }

        next.proceed(ctx)?;

        if !ctx.excluded.is_empty() {
            let excluded = &ctx.excluded;
            ctx.selected.retain(|task| !excluded.contains(&task.path));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::config::SelectorMode;
    use crate::configuration::{BuildConfigurationActionExecuter, BuildRequest};
    use crate::error::SelectionError;
    use crate::project::{ProjectModel, Task, TaskPath};

    fn model() -> ProjectModel {
        let mut builder = ProjectModel::builder("demo");
        for path in [":app:test", ":lib:test", ":build"] {
            builder = builder
                .task(Task::builder(TaskPath::parse(path).unwrap()).build())
                .unwrap();
        }
        builder.build()
    }

    #[test]
    fn test_bare_exclusion_covers_all_projects() {
        let request = BuildRequest::tasks([":build"]).exclude("test");
        let selection = BuildConfigurationActionExecuter::new()
            .select(&model(), SelectorMode::Unique, &request)
            .unwrap();

        let excluded: Vec<String> = selection.excluded.iter().map(ToString::to_string).collect();
        assert_eq!(excluded, vec![":app:test", ":lib:test"]);
        assert_eq!(selection.tasks.len(), 1);
    }

    #[test]
    fn test_unknown_exclusion_is_fatal() {
        let request = BuildRequest::tasks([":build"]).exclude("deploy");
        let err = BuildConfigurationActionExecuter::new()
            .select(&model(), SelectorMode::Unique, &request)
            .unwrap_err();
        assert!(matches!(err, SelectionError::UnknownTask { .. }));
    }
}
