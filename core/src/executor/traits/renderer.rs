use crate::executor::types::{BuildReport, TaskOutcome};

/// Output renderer plugin (controls the output format)
pub trait OutputRendererPlugin: Send + Sync {
    fn name(&self) -> &str;
    fn format(&self) -> &str;
    fn render(&self, event: &RenderEvent);
}

/// Render events emitted over the life of one build
#[derive(Debug, Clone)]
pub enum RenderEvent {
    BuildStart {
        build_id: String,
        total_tasks: usize,
        dry_run: bool,
    },
    /// Kahn stages of the task graph, each task rendered as its path.
    Plan {
        build_id: String,
        stages: Vec<Vec<String>>,
        dry_run: bool,
    },
    TaskStart {
        build_id: String,
        task: String,
    },
    TaskComplete {
        build_id: String,
        outcome: TaskOutcome,
    },
    BuildEnd {
        build_id: String,
        report: BuildReport,
    },
}
