//! The configured project hierarchy: projects, tasks, their declared dependencies,
//! shared resources and actions.

mod action;
mod load;
mod model;
mod path;

pub use action::{FnAction, NoopAction, TaskAction, TaskContext};
pub use load::{
    load_project_model, parse_project_model, ActionFactory, ActionSpec, ProjectSpec, TaskSpec,
    BUILD_FILE_NAME,
};
pub use model::{Project, ProjectModel, ProjectModelBuilder, ResourceId, Task, TaskBuilder};
pub use path::{ProjectPath, TaskPath, PATH_SEPARATOR};
