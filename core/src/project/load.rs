use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

use super::action::TaskAction;
use super::model::{ProjectModel, ProjectModelBuilder, Task};
use super::path::{ProjectPath, TaskPath};

pub const BUILD_FILE_NAME: &str = "kiln.toml";

/// One project section of a build file. Sub-projects nest under `projects.<name>`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectSpec {
    #[serde(default)]
    pub default_tasks: Vec<String>,

    #[serde(default)]
    pub tasks: BTreeMap<String, TaskSpec>,

    #[serde(default)]
    pub projects: BTreeMap<String, ProjectSpec>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskSpec {
    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub depends_on: Vec<String>,

    /// Shared resources the task mutates. `"project"` expands to the owning project's state.
    #[serde(default)]
    pub resources: Vec<String>,

    #[serde(default)]
    pub action: Option<ActionSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ActionSpec {
    Shell {
        command: String,
        #[serde(default)]
        workdir: Option<String>,
    },
    Sleep {
        millis: u64,
    },
    Fail {
        #[serde(default = "default_fail_message")]
        message: String,
    },
    Noop,
}

fn default_fail_message() -> String {
    "task failed".to_string()
}

/// Turns declarative action specs into runnable actions; implemented by the plugins crate.
pub trait ActionFactory: Send + Sync {
    fn create(&self, task: &TaskPath, spec: &ActionSpec) -> Result<Arc<dyn TaskAction>, ModelError>;
}

pub fn load_project_model(
    build_file: &Path,
    factory: &dyn ActionFactory,
) -> Result<ProjectModel, ModelError> {
    let src = std::fs::read_to_string(build_file).map_err(|source| ModelError::Io {
        path: build_file.display().to_string(),
        source,
    })?;
    let root_name = build_file
        .parent()
        .and_then(|dir| dir.file_name())
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "root".to_string());
    parse_project_model(&src, &root_name, factory)
}

pub fn parse_project_model(
    src: &str,
    root_name: &str,
    factory: &dyn ActionFactory,
) -> Result<ProjectModel, ModelError> {
    let spec: ProjectSpec = toml::from_str(src)?;
    let builder = ProjectModel::builder(root_name);
    let builder = add_project(builder, &ProjectPath::root(), &spec, factory)?;
    Ok(builder.build())
}

fn add_project(
    mut builder: ProjectModelBuilder,
    path: &ProjectPath,
    spec: &ProjectSpec,
    factory: &dyn ActionFactory,
) -> Result<ProjectModelBuilder, ModelError> {
    builder = builder
        .project(path)
        .default_tasks(path, spec.default_tasks.iter().cloned());

    for (name, task_spec) in &spec.tasks {
        let task_path = path.task(name)?;
        let mut task = Task::builder(task_path.clone());
        if let Some(description) = &task_spec.description {
            task = task.description(description.clone());
        }
        for dep in &task_spec.depends_on {
            task = task.depends_on(dep.clone());
        }
        for resource in &task_spec.resources {
            task = if resource == "project" {
                task.resource(super::ResourceId::project_state(path).as_str())
            } else {
                task.resource(resource.clone())
            };
        }
        if let Some(action) = &task_spec.action {
            task = task.action(factory.create(&task_path, action)?);
        }
        builder = builder.task(task.build())?;
    }

    for (name, child) in &spec.projects {
        builder = add_project(builder, &path.child(name)?, child, factory)?;
    }
    Ok(builder)
}
