//! Task actions that `kiln.toml` can declare.

mod fail;
mod shell;
mod sleep;

pub use fail::FailAction;
pub use shell::ShellAction;
pub use sleep::SleepAction;

/// Environment variable name under which a task option is exported.
///
/// `--tests=Foo` becomes `KILN_OPT_TESTS=Foo`; a flag such as `--rerun` becomes `KILN_OPT_RERUN=true`.
pub fn option_env_name(option: &str) -> String {
    let name: String = option
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("KILN_OPT_{name}")
}
