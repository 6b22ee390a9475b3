use std::path::{Path, PathBuf};
use std::sync::Arc;

use kiln_core::api::{
    ActionFactory, ActionSpec, ModelError, NoopAction, OutputRendererPlugin, TaskAction, TaskPath,
};

use crate::actions::{FailAction, ShellAction, SleepAction};
use crate::executor::{JsonlRendererPlugin, TextRendererPlugin};

/// Builds actions for `kiln.toml` tasks. Relative shell `workdir`s resolve against `base_dir`.
pub struct PluginActionFactory {
    base_dir: PathBuf,
}

impl PluginActionFactory {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    fn resolve_workdir(&self, workdir: Option<&str>) -> PathBuf {
        match workdir {
            Some(dir) if Path::new(dir).is_absolute() => PathBuf::from(dir),
            Some(dir) => self.base_dir.join(dir),
            None => self.base_dir.clone(),
        }
    }
}

impl ActionFactory for PluginActionFactory {
    fn create(&self, task: &TaskPath, spec: &ActionSpec) -> Result<Arc<dyn TaskAction>, ModelError> {
        tracing::trace!(task = %task, ?spec, "creating action");
        let action: Arc<dyn TaskAction> = match spec {
            ActionSpec::Shell { command, workdir } => Arc::new(ShellAction::new(
                command.clone(),
                Some(self.resolve_workdir(workdir.as_deref())),
            )),
            ActionSpec::Sleep { millis } => Arc::new(SleepAction::new(*millis)),
            ActionSpec::Fail { message } => Arc::new(FailAction::new(message.clone())),
            ActionSpec::Noop => Arc::new(NoopAction),
        };
        Ok(action)
    }
}

pub fn build_renderer(format: &str) -> Arc<dyn OutputRendererPlugin> {
    match format {
        "jsonl" => Arc::new(JsonlRendererPlugin::new(false)),
        // anything else renders as text
        _ => Arc::new(TextRendererPlugin::new(false)),
    }
}
