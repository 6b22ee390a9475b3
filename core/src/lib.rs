//! kiln core: project model, task selection, build configuration, task graph planning
//! and concurrent execution.

pub mod api;
pub mod build;
pub mod config;
pub mod configuration;
pub mod error;
pub mod executor;
pub mod project;
pub mod selection;
