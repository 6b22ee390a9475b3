use serde::Serialize;

use crate::error::SelectionError;

const OPTION_PREFIX: &str = "--";

/// A task-local command-line option: `--rerun` (flag) or `--tests=Foo*`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskArg {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl TaskArg {
    pub fn flag(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }

    pub fn with_value(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }
}

/// One requested task name or path plus the options that follow it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskInvocation {
    pub name: String,
    pub args: Vec<TaskArg>,
}

impl TaskInvocation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }
}

/// Splits `["test", "--tests=Foo*", "--rerun", "build"]` into task invocations.
pub struct CommandLineTaskParser;

impl CommandLineTaskParser {
    pub fn parse<I, S>(tokens: I) -> Result<Vec<TaskInvocation>, SelectionError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut invocations: Vec<TaskInvocation> = Vec::new();
        for token in tokens {
            let token = token.as_ref();
            let Some(option) = token.strip_prefix(OPTION_PREFIX) else {
                invocations.push(TaskInvocation::new(token));
                continue;
            };
            let arg = match option.split_once('=') {
                Some((name, value)) => TaskArg::with_value(name, value),
                None => TaskArg::flag(option),
            };
            if arg.name.is_empty() {
                return Err(SelectionError::InvalidTaskOption(token.to_string()));
            }
            match invocations.last_mut() {
                Some(invocation) => invocation.args.push(arg),
                None => return Err(SelectionError::TaskOptionWithoutTask(token.to_string())),
            }
        }
        Ok(invocations)
    }
}
