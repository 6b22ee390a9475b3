pub mod listener;
pub mod renderer;

pub use listener::*;
pub use renderer::*;
