//! Resolving what the user typed to tasks of the project model.
//!
//! - [`CommandLineTaskParser`] splits raw arguments into task invocations with their options.
//! - [`TaskSelector`] resolves one name or path, with camel-case abbreviations, to task paths.

mod matcher;
mod parser;
mod selector;

pub use matcher::{NameMatch, NameMatcher};
pub use parser::{CommandLineTaskParser, TaskArg, TaskInvocation};
pub use selector::TaskSelector;
