mod load;
mod types;

pub use load::{get_kiln_data_dir, load_default, load_from};
pub use types::{AppConfig, ExclusionPolicy, ExecutionConfig, LoggingConfig, SelectorMode};
