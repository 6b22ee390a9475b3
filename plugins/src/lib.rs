pub mod actions;
pub mod executor;
pub mod factory;
