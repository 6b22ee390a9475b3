use std::path::PathBuf;
use std::process::Stdio;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use kiln_core::api::{TaskAction, TaskContext};
use tokio::process::Command;

use super::option_env_name;

/// Runs a command through `sh -c`. A non-zero exit status fails the task.
pub struct ShellAction {
    command: String,
    workdir: Option<PathBuf>,
}

impl ShellAction {
    pub fn new(command: impl Into<String>, workdir: Option<PathBuf>) -> Self {
        Self {
            command: command.into(),
            workdir,
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    fn build_command(&self, ctx: &TaskContext) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(&self.command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .env("KILN_TASK", ctx.path.to_string())
            .kill_on_drop(true);
        for arg in &ctx.args {
            let value = arg.value.clone().unwrap_or_else(|| "true".to_string());
            cmd.env(option_env_name(&arg.name), value);
        }
        if let Some(dir) = &self.workdir {
            cmd.current_dir(dir);
        }
        cmd
    }
}

#[async_trait]
impl TaskAction for ShellAction {
    fn describe(&self) -> String {
        format!("sh -c {:?}", self.command)
    }

    async fn execute(&self, ctx: &TaskContext) -> Result<()> {
        tracing::debug!(task = %ctx.path, command = %self.command, "spawning shell");
        let output = self
            .build_command(ctx)
            .output()
            .await
            .with_context(|| format!("failed to spawn `{}`", self.command))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        for line in stdout.lines() {
            tracing::info!(task = %ctx.path, "{line}");
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let code = output
                .status
                .code()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".to_string());
            match stderr.trim() {
                "" => bail!("command `{}` exited with {code}", self.command),
                detail => bail!("command `{}` exited with {code}: {detail}", self.command),
            }
        }
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use kiln_core::api::{BuildCancellationToken, TaskArg, TaskPath};

    fn ctx(args: Vec<TaskArg>) -> TaskContext {
        TaskContext {
            path: TaskPath::parse(":app:test").unwrap(),
            args,
            cancel: BuildCancellationToken::new(),
        }
    }

    #[tokio::test]
    async fn test_success() {
        let action = ShellAction::new("true", None);
        action.execute(&ctx(Vec::new())).await.unwrap();
    }

    #[tokio::test]
    async fn test_non_zero_exit_fails_with_stderr() {
        let action = ShellAction::new("echo broken >&2; exit 3", None);
        let err = action.execute(&ctx(Vec::new())).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "command `echo broken >&2; exit 3` exited with 3: broken"
        );
    }

    #[tokio::test]
    async fn test_task_options_exported_to_environment() {
        let dir = tempfile::tempdir().unwrap();
        let action = ShellAction::new(
            r#"printf '%s %s %s' "$KILN_TASK" "$KILN_OPT_TESTS" "$KILN_OPT_RERUN" > out.txt"#,
            Some(dir.path().to_path_buf()),
        );
        action
            .execute(&ctx(vec![
                TaskArg::with_value("tests", "Foo*"),
                TaskArg::flag("rerun"),
            ]))
            .await
            .unwrap();

        let written = std::fs::read_to_string(dir.path().join("out.txt")).unwrap();
        assert_eq!(written, ":app:test Foo* true");
    }
}
