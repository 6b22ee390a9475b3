//! kiln command line front end; modules are public for tests.

pub mod app;
pub mod commands;
pub mod error;
