#[allow(clippy::module_inception)]
pub mod error;
pub mod executor;
pub mod graph;
pub mod model;
pub mod selection;

pub use error::BuildError;
pub use executor::{ExecutorError, TaskFailure};
pub use graph::GraphError;
pub use model::ModelError;
pub use selection::SelectionError;
