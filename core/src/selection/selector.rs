use std::collections::BTreeMap;

use crate::config::SelectorMode;
use crate::error::SelectionError;
use crate::project::{Project, ProjectModel, ProjectPath, TaskPath, PATH_SEPARATOR};

use super::matcher::{NameMatch, NameMatcher};

/// Resolves task names and paths typed by the user to tasks of the project model.
///
/// Pure lookup: the model is never modified.
#[derive(Clone, Copy)]
pub struct TaskSelector<'m> {
    model: &'m ProjectModel,
    mode: SelectorMode,
}

impl<'m> TaskSelector<'m> {
    pub fn new(model: &'m ProjectModel, mode: SelectorMode) -> Self {
        Self { model, mode }
    }

    pub fn model(&self) -> &'m ProjectModel {
        self.model
    }

    /// Resolves `request` relative to `start`. Returned paths are sorted and non-empty.
    pub fn select(
        &self,
        start: &ProjectPath,
        request: &str,
    ) -> Result<Vec<TaskPath>, SelectionError> {
        let start = self.start_project(start)?;
        if request.contains(PATH_SEPARATOR) {
            self.select_path(start, request).map(|path| vec![path])
        } else {
            self.select_name(start, request)
        }
    }

    /// The project bare names and relative paths resolve against. It must exist exactly;
    /// near project paths come back as suggestions.
    pub fn start_project(&self, start: &ProjectPath) -> Result<&'m Project, SelectionError> {
        if let Some(project) = self.model.project(start) {
            return Ok(project);
        }
        let known: Vec<String> = self
            .model
            .root()
            .all_projects()
            .into_iter()
            .map(|p| p.path().to_string())
            .collect();
        let requested = start.to_string();
        let suggestions = match NameMatcher::find(&requested, known.iter().map(String::as_str)) {
            NameMatch::Found(path) => vec![path],
            NameMatch::Ambiguous(paths) | NameMatch::NotFound(paths) => paths,
        };
        Err(SelectionError::UnknownProject {
            request: requested,
            scope: ProjectPath::root().describe(),
            suggestions,
        })
    }

    /// `:app:build` (from the root) or `app:build` (from `start`); every segment may be abbreviated.
    fn select_path(&self, start: &'m Project, request: &str) -> Result<TaskPath, SelectionError> {
        let (mut project, rest) = match request.strip_prefix(PATH_SEPARATOR) {
            Some(rest) => (self.model.root(), rest),
            None => (start, request),
        };
        let mut segments: Vec<&str> = rest.split(PATH_SEPARATOR).collect();
        let task_name = segments.pop().unwrap_or_default();

        for segment in segments {
            let scope = project.path().describe();
            project = match NameMatcher::find(segment, project.children().map(Project::name)) {
                NameMatch::Found(name) => project.child(&name).ok_or_else(|| {
                    SelectionError::UnknownProject {
                        request: segment.to_string(),
                        scope: scope.clone(),
                        suggestions: Vec::new(),
                    }
                })?,
                NameMatch::Ambiguous(names) => {
                    return Err(SelectionError::AmbiguousProject {
                        request: segment.to_string(),
                        candidates: names
                            .iter()
                            .map(|n| project.path().child_unchecked(n).to_string())
                            .collect(),
                        scope,
                    })
                }
                NameMatch::NotFound(suggestions) => {
                    return Err(SelectionError::UnknownProject {
                        request: segment.to_string(),
                        scope,
                        suggestions,
                    })
                }
            };
        }

        let scope = project.path().describe();
        match NameMatcher::find(task_name, project.tasks().map(|t| t.name())) {
            NameMatch::Found(name) => project
                .task(&name)
                .map(|task| task.path().clone())
                .ok_or_else(|| SelectionError::UnknownTask {
                    request: request.to_string(),
                    scope,
                    suggestions: Vec::new(),
                }),
            NameMatch::Ambiguous(names) => Err(SelectionError::AmbiguousTask {
                request: request.to_string(),
                scope,
                candidates: names
                    .iter()
                    .filter_map(|n| project.task(n))
                    .map(|task| task.path().to_string())
                    .collect(),
            }),
            NameMatch::NotFound(suggestions) => Err(SelectionError::UnknownTask {
                request: request.to_string(),
                scope,
                suggestions,
            }),
        }
    }

    /// Bare name: matched against every task name in `start` and its sub-projects.
    fn select_name(
        &self,
        start: &'m Project,
        request: &str,
    ) -> Result<Vec<TaskPath>, SelectionError> {
        let mut by_name: BTreeMap<&str, Vec<TaskPath>> = BTreeMap::new();
        for project in start.all_projects() {
            for task in project.tasks() {
                by_name
                    .entry(task.name())
                    .or_default()
                    .push(task.path().clone());
            }
        }

        let scope = start.path().describe();
        match NameMatcher::find(request, by_name.keys().copied()) {
            NameMatch::Found(name) => {
                let mut paths = by_name.remove(name.as_str()).unwrap_or_default();
                paths.sort();
                if paths.is_empty() {
                    return Err(SelectionError::UnknownTask {
                        request: request.to_string(),
                        scope,
                        suggestions: Vec::new(),
                    });
                }
                if self.mode == SelectorMode::Unique && paths.len() > 1 {
                    return Err(SelectionError::AmbiguousTask {
                        request: request.to_string(),
                        scope,
                        candidates: paths.iter().map(ToString::to_string).collect(),
                    });
                }
                Ok(paths)
            }
            NameMatch::Ambiguous(candidates) => Err(SelectionError::AmbiguousTask {
                request: request.to_string(),
                scope,
                candidates,
            }),
            NameMatch::NotFound(suggestions) => Err(SelectionError::UnknownTask {
                request: request.to_string(),
                scope,
                suggestions,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::Task;
    use pretty_assertions::assert_eq;

    fn model() -> ProjectModel {
        let mut builder = ProjectModel::builder("demo");
        for path in [
            ":app:build",
            ":app:compileJava",
            ":app:compileTestJava",
            ":lib:build",
            ":lib:jar",
            ":help",
        ] {
            builder = builder
                .task(Task::builder(TaskPath::parse(path).unwrap()).build())
                .unwrap();
        }
        builder.build()
    }

    fn select(mode: SelectorMode, request: &str) -> Result<Vec<String>, SelectionError> {
        let model = model();
        TaskSelector::new(&model, mode)
            .select(&ProjectPath::root(), request)
            .map(|paths| paths.iter().map(ToString::to_string).collect())
    }

    #[test]
    fn test_bare_name_in_two_projects_is_ambiguous() {
        let err = select(SelectorMode::Unique, "build").unwrap_err();
        assert_eq!(
            err,
            SelectionError::AmbiguousTask {
                request: "build".to_string(),
                scope: "root project".to_string(),
                candidates: vec![":app:build".to_string(), ":lib:build".to_string()],
            }
        );
    }

    #[test]
    fn test_bare_name_all_projects_mode_selects_every_match() {
        assert_eq!(
            select(SelectorMode::AllProjects, "build").unwrap(),
            vec![":app:build".to_string(), ":lib:build".to_string()]
        );
    }

    #[test]
    fn test_exact_path_is_unique() {
        assert_eq!(
            select(SelectorMode::Unique, ":app:build").unwrap(),
            vec![":app:build".to_string()]
        );
        assert_eq!(
            select(SelectorMode::Unique, "lib:jar").unwrap(),
            vec![":lib:jar".to_string()]
        );
    }

    #[test]
    fn test_abbreviated_path_segments() {
        assert_eq!(
            select(SelectorMode::Unique, ":a:cTJ").unwrap(),
            vec![":app:compileTestJava".to_string()]
        );
        assert_eq!(
            select(SelectorMode::Unique, "cJ").unwrap(),
            vec![":app:compileJava".to_string()]
        );
    }

    #[test]
    fn test_ambiguous_abbreviation_in_project() {
        let err = select(SelectorMode::Unique, ":app:comp").unwrap_err();
        assert_eq!(
            err.candidates(),
            [
                ":app:compileJava".to_string(),
                ":app:compileTestJava".to_string()
            ]
        );
    }

    #[test]
    fn test_unknown_task_and_project() {
        assert!(matches!(
            select(SelectorMode::Unique, ":app:deploy"),
            Err(SelectionError::UnknownTask { .. })
        ));
        assert!(matches!(
            select(SelectorMode::Unique, ":web:build"),
            Err(SelectionError::UnknownProject { .. })
        ));
        assert!(matches!(
            select(SelectorMode::Unique, "deploy"),
            Err(SelectionError::UnknownTask { .. })
        ));
    }

    #[test]
    fn test_start_project_scopes_bare_names() {
        let model = model();
        let selector = TaskSelector::new(&model, SelectorMode::Unique);
        let lib = ProjectPath::parse(":lib").unwrap();

        let paths = selector.select(&lib, "build").unwrap();
        assert_eq!(paths, vec![TaskPath::parse(":lib:build").unwrap()]);
        assert!(selector.select(&lib, "help").is_err());
    }

    #[test]
    fn test_missing_start_project_is_rejected() {
        let model = model();
        let selector = TaskSelector::new(&model, SelectorMode::Unique);
        let nope = ProjectPath::parse(":nope").unwrap();

        let err = selector.select(&nope, "build").unwrap_err();
        assert_eq!(
            err,
            SelectionError::UnknownProject {
                request: ":nope".to_string(),
                scope: "root project".to_string(),
                suggestions: Vec::new(),
            }
        );

        let typo = ProjectPath::parse(":lbi").unwrap();
        assert!(matches!(
            selector.start_project(&typo),
            Err(SelectionError::UnknownProject { suggestions, .. }) if suggestions == [":lib"]
        ));
    }
}
