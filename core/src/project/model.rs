use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

use super::action::{NoopAction, TaskAction};
use super::path::{ProjectPath, TaskPath};

/// Identity of a piece of shared mutable build state, e.g. `project:app`.
///
/// Locks are always acquired in the `Ord` order of these ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The conventional resource guarding a project's mutable state.
    pub fn project_state(project: &ProjectPath) -> Self {
        Self(format!("project{project}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone)]
pub struct Task {
    path: TaskPath,
    description: Option<String>,
    dependencies: Vec<String>,
    resources: Vec<ResourceId>,
    action: Arc<dyn TaskAction>,
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("path", &self.path)
            .field("dependencies", &self.dependencies)
            .field("resources", &self.resources)
            .field("action", &self.action.describe())
            .finish()
    }
}

impl Task {
    pub fn builder(path: TaskPath) -> TaskBuilder {
        TaskBuilder {
            path,
            description: None,
            dependencies: Vec::new(),
            resources: Vec::new(),
            action: None,
        }
    }

    pub fn path(&self) -> &TaskPath {
        &self.path
    }

    pub fn name(&self) -> &str {
        self.path.name()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Declared dependencies: absolute (`:lib:jar`) or relative to the owning project (`compile`).
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub fn resources(&self) -> &[ResourceId] {
        &self.resources
    }

    pub fn action(&self) -> Arc<dyn TaskAction> {
        Arc::clone(&self.action)
    }
}

pub struct TaskBuilder {
    path: TaskPath,
    description: Option<String>,
    dependencies: Vec<String>,
    resources: Vec<ResourceId>,
    action: Option<Arc<dyn TaskAction>>,
}

impl TaskBuilder {
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn depends_on(mut self, dependency: impl Into<String>) -> Self {
        self.dependencies.push(dependency.into());
        self
    }

    pub fn resource(mut self, resource: impl Into<String>) -> Self {
        self.resources.push(ResourceId::new(resource));
        self
    }

    pub fn action(mut self, action: Arc<dyn TaskAction>) -> Self {
        self.action = Some(action);
        self
    }

    pub fn build(self) -> Task {
        Task {
            path: self.path,
            description: self.description,
            dependencies: self.dependencies,
            resources: self.resources,
            action: self.action.unwrap_or_else(|| Arc::new(NoopAction)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Project {
    path: ProjectPath,
    name: String,
    children: BTreeMap<String, Project>,
    tasks: BTreeMap<String, Task>,
    default_tasks: Vec<String>,
}

impl Project {
    fn new(path: ProjectPath, name: String) -> Self {
        Self {
            path,
            name,
            children: BTreeMap::new(),
            tasks: BTreeMap::new(),
            default_tasks: Vec::new(),
        }
    }

    pub fn path(&self) -> &ProjectPath {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn children(&self) -> impl Iterator<Item = &Project> {
        self.children.values()
    }

    pub fn child(&self, name: &str) -> Option<&Project> {
        self.children.get(name)
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    pub fn task(&self, name: &str) -> Option<&Task> {
        self.tasks.get(name)
    }

    pub fn default_tasks(&self) -> &[String] {
        &self.default_tasks
    }

    /// This project followed by all descendants, depth first, children in name order.
    pub fn all_projects(&self) -> Vec<&Project> {
        let mut out = vec![self];
        for child in self.children.values() {
            out.extend(child.all_projects());
        }
        out
    }
}

/// The configured project hierarchy a build runs against.
#[derive(Debug, Clone)]
pub struct ProjectModel {
    root: Project,
}

impl ProjectModel {
    pub fn builder(root_name: impl Into<String>) -> ProjectModelBuilder {
        ProjectModelBuilder {
            root: Project::new(ProjectPath::root(), root_name.into()),
        }
    }

    pub fn root(&self) -> &Project {
        &self.root
    }

    pub fn project(&self, path: &ProjectPath) -> Option<&Project> {
        path.segments()
            .try_fold(&self.root, |project, segment| project.child(segment))
    }

    pub fn task(&self, path: &TaskPath) -> Option<&Task> {
        self.project(path.project())
            .and_then(|project| project.task(path.name()))
    }

    pub fn task_count(&self) -> usize {
        self.root.all_projects().iter().map(|p| p.tasks.len()).sum()
    }
}

pub struct ProjectModelBuilder {
    root: Project,
}

impl ProjectModelBuilder {
    /// Registers a project, creating missing ancestors.
    pub fn project(mut self, path: &ProjectPath) -> Self {
        self.project_mut(path);
        self
    }

    pub fn task(mut self, task: Task) -> Result<Self, ModelError> {
        let project = self.project_mut(task.path.project());
        let name = task.name().to_string();
        if project.tasks.contains_key(&name) {
            return Err(ModelError::DuplicateTask(task.path.to_string()));
        }
        project.tasks.insert(name, task);
        Ok(self)
    }

    pub fn default_tasks<I, S>(mut self, project: &ProjectPath, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.project_mut(project).default_tasks = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn build(self) -> ProjectModel {
        ProjectModel { root: self.root }
    }

    fn project_mut(&mut self, path: &ProjectPath) -> &mut Project {
        let mut current = &mut self.root;
        for segment in path.segments() {
            let child_path = current.path.child_unchecked(segment);
            current = current
                .children
                .entry(segment.to_string())
                .or_insert_with(|| Project::new(child_path, segment.to_string()));
        }
        current
    }
}
