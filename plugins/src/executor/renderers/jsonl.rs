use chrono::Local;
use kiln_core::api::{OutputRendererPlugin, RenderEvent, TaskState};
use serde_json::{json, Value};

/// One JSON object per line, for machine consumers.
pub struct JsonlRendererPlugin {
    pretty_print: bool,
}

impl JsonlRendererPlugin {
    pub fn new(pretty_print: bool) -> Self {
        Self { pretty_print }
    }

    fn event_to_json(&self, event: &RenderEvent) -> Value {
        let ts = Local::now().to_rfc3339();
        match event {
            RenderEvent::BuildStart {
                build_id,
                total_tasks,
                dry_run,
            } => json!({
                "v": 1,
                "event_type": "build.start",
                "ts": ts,
                "build_id": build_id,
                "metadata": {
                    "total_tasks": total_tasks,
                    "dry_run": dry_run,
                }
            }),
            RenderEvent::Plan {
                build_id,
                stages,
                dry_run,
            } => {
                let total_tasks: usize = stages.iter().map(|s| s.len()).sum();
                json!({
                    "v": 1,
                    "event_type": "build.plan",
                    "ts": ts,
                    "build_id": build_id,
                    "metadata": {
                        "stages": stages,
                        "total_tasks": total_tasks,
                        "dry_run": dry_run,
                    }
                })
            }
            RenderEvent::TaskStart { build_id, task } => json!({
                "v": 1,
                "event_type": "task.start",
                "ts": ts,
                "build_id": build_id,
                "task": task,
            }),
            RenderEvent::TaskComplete { build_id, outcome } => json!({
                "v": 1,
                "event_type": "task.end",
                "ts": ts,
                "build_id": build_id,
                "task": outcome.path,
                "state": outcome.state,
                "metadata": {
                    "duration_ms": outcome.duration_ms,
                    "error": outcome.error,
                    "success": outcome.state == TaskState::Succeeded,
                }
            }),
            RenderEvent::BuildEnd { build_id, report } => json!({
                "v": 1,
                "event_type": "build.end",
                "ts": ts,
                "build_id": build_id,
                "metadata": {
                    "success": report.is_success(),
                    "dry_run": report.dry_run,
                    "total_tasks": report.tasks.len(),
                    "succeeded": report.count(TaskState::Succeeded),
                    "failed": report.count(TaskState::Failed),
                    "skipped": report.count(TaskState::Skipped),
                    "cancelled": report.count(TaskState::Cancelled),
                    "cancel_reason": report.cancel_reason,
                    "failures": report.failures,
                    "retained_exclusions": report.retained_exclusions,
                    "peak_concurrency": report.peak_concurrency,
                    "duration_ms": report.duration_ms,
                }
            }),
        }
    }
}

impl OutputRendererPlugin for JsonlRendererPlugin {
    fn name(&self) -> &str {
        "jsonl-renderer"
    }

    fn format(&self) -> &str {
        "jsonl"
    }

    fn render(&self, event: &RenderEvent) {
        let value = self.event_to_json(event);
        if self.pretty_print {
            println!("{}", serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".into()));
        } else {
            println!("{}", serde_json::to_string(&value).unwrap_or_else(|_| "{}".into()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_core::api::{BuildReport, TaskFailure, TaskOutcome, TaskPath};

    #[test]
    fn test_jsonl_renderer_event_type() {
        let renderer = JsonlRendererPlugin::new(false);
        let event = RenderEvent::BuildStart {
            build_id: "b1".to_string(),
            total_tasks: 2,
            dry_run: false,
        };

        let value = renderer.event_to_json(&event);
        assert_eq!(value["event_type"], "build.start");
        assert_eq!(value["metadata"]["total_tasks"], 2);
    }

    #[test]
    fn test_jsonl_renderer_task_complete() {
        let renderer = JsonlRendererPlugin::new(false);
        let event = RenderEvent::TaskComplete {
            build_id: "b1".to_string(),
            outcome: TaskOutcome {
                path: TaskPath::parse(":lib:compile").unwrap(),
                state: TaskState::Failed,
                duration_ms: Some(7),
                error: Some("exit 2".to_string()),
            },
        };

        let value = renderer.event_to_json(&event);
        assert_eq!(value["event_type"], "task.end");
        assert_eq!(value["task"], ":lib:compile");
        assert_eq!(value["state"], "failed");
        assert_eq!(value["metadata"]["success"], false);
        assert_eq!(value["metadata"]["error"], "exit 2");
    }

    #[test]
    fn test_jsonl_renderer_build_end() {
        let renderer = JsonlRendererPlugin::new(false);
        let event = RenderEvent::BuildEnd {
            build_id: "b1".to_string(),
            report: BuildReport {
                build_id: "b1".to_string(),
                tasks: vec![TaskOutcome {
                    path: TaskPath::parse(":a").unwrap(),
                    state: TaskState::Failed,
                    duration_ms: Some(1),
                    error: Some("boom".to_string()),
                }],
                failures: vec![TaskFailure {
                    path: TaskPath::parse(":a").unwrap(),
                    message: "boom".to_string(),
                }],
                cancel_reason: None,
                dry_run: false,
                duration_ms: 100,
                peak_concurrency: 1,
                retained_exclusions: Vec::new(),
            },
        };

        let value = renderer.event_to_json(&event);
        assert_eq!(value["metadata"]["total_tasks"], 1);
        assert_eq!(value["metadata"]["failed"], 1);
        assert_eq!(value["metadata"]["failures"][0]["path"], ":a");
        assert!(value["metadata"]["cancel_reason"].is_null());
    }
}
