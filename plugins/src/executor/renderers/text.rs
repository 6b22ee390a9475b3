use kiln_core::api::{BuildReport, OutputRendererPlugin, RenderEvent, TaskOutcome, TaskState};

/// Human readable build output on stdout.
pub struct TextRendererPlugin {
    /// Also print the stage plan before a real build.
    show_plan: bool,
}

impl TextRendererPlugin {
    pub fn new(show_plan: bool) -> Self {
        Self { show_plan }
    }

    fn format_event(&self, event: &RenderEvent) -> Option<String> {
        match event {
            RenderEvent::BuildStart { .. } | RenderEvent::TaskStart { .. } => None,
            RenderEvent::Plan {
                stages, dry_run, ..
            } => {
                if *dry_run {
                    let lines: Vec<String> = stages
                        .iter()
                        .flatten()
                        .map(|task| format!("{task} {}", TaskState::Skipped))
                        .collect();
                    return Some(lines.join("\n"));
                }
                if !self.show_plan {
                    return None;
                }
                let mut out = "PLAN:".to_string();
                for (idx, stage) in stages.iter().enumerate() {
                    out.push_str(&format!("\n  stage {}: {}", idx, stage.join(", ")));
                }
                Some(out)
            }
            RenderEvent::TaskComplete { outcome, .. } => Some(format_outcome(outcome)),
            RenderEvent::BuildEnd { report, .. } => Some(format_summary(report)),
        }
    }
}

fn format_outcome(outcome: &TaskOutcome) -> String {
    let mut line = format!("{} {}", outcome.path, outcome.state);
    if let Some(ms) = outcome.duration_ms {
        line.push_str(&format!(" ({ms}ms)"));
    }
    if let Some(error) = &outcome.error {
        line.push_str(&format!(": {error}"));
    }
    line
}

fn format_summary(report: &BuildReport) -> String {
    let mut out = String::new();
    for excluded in &report.retained_exclusions {
        out.push_str(&format!(
            "warning: excluded task {excluded} is retained because other tasks depend on it\n"
        ));
    }
    if report.dry_run {
        out.push_str(&format!(
            "BUILD SUCCESSFUL (dry run, {} tasks)",
            report.tasks.len()
        ));
        return out;
    }

    let verdict = if report.is_success() {
        "BUILD SUCCESSFUL"
    } else if report.failures.is_empty() {
        "BUILD CANCELLED"
    } else {
        "BUILD FAILED"
    };
    out.push_str(&format!(
        "{verdict} in {}ms ({} tasks: {} succeeded, {} failed, {} skipped, {} cancelled)",
        report.duration_ms,
        report.tasks.len(),
        report.count(TaskState::Succeeded),
        report.count(TaskState::Failed),
        report.count(TaskState::Skipped),
        report.count(TaskState::Cancelled),
    ));
    out
}

impl OutputRendererPlugin for TextRendererPlugin {
    fn name(&self) -> &str {
        "text-renderer"
    }

    fn format(&self) -> &str {
        "text"
    }

    fn render(&self, event: &RenderEvent) {
        if let Some(text) = self.format_event(event) {
            println!("{text}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_core::api::TaskPath;
    use pretty_assertions::assert_eq;

    fn outcome(path: &str, state: TaskState, error: Option<&str>) -> TaskOutcome {
        TaskOutcome {
            path: TaskPath::parse(path).unwrap(),
            state,
            duration_ms: error.map(|_| 4),
            error: error.map(str::to_string),
        }
    }

    fn report(tasks: Vec<TaskOutcome>, dry_run: bool) -> BuildReport {
        BuildReport {
            build_id: "b1".to_string(),
            tasks,
            failures: Vec::new(),
            cancel_reason: None,
            dry_run,
            duration_ms: 12,
            peak_concurrency: 1,
            retained_exclusions: Vec::new(),
        }
    }

    #[test]
    fn test_dry_run_plan_lines() {
        let renderer = TextRendererPlugin::new(false);
        let event = RenderEvent::Plan {
            build_id: "b1".to_string(),
            stages: vec![
                vec![":compile".to_string(), ":lint".to_string()],
                vec![":build".to_string()],
            ],
            dry_run: true,
        };
        assert_eq!(
            renderer.format_event(&event).unwrap(),
            ":compile SKIPPED\n:lint SKIPPED\n:build SKIPPED"
        );
    }

    #[test]
    fn test_plan_hidden_for_real_builds() {
        let event = RenderEvent::Plan {
            build_id: "b1".to_string(),
            stages: vec![vec![":compile".to_string()]],
            dry_run: false,
        };
        assert!(TextRendererPlugin::new(false).format_event(&event).is_none());
        assert_eq!(
            TextRendererPlugin::new(true).format_event(&event).unwrap(),
            "PLAN:\n  stage 0: :compile"
        );
    }

    #[test]
    fn test_failed_task_line() {
        let renderer = TextRendererPlugin::new(false);
        let event = RenderEvent::TaskComplete {
            build_id: "b1".to_string(),
            outcome: outcome(":app:test", TaskState::Failed, Some("exit 1")),
        };
        assert_eq!(
            renderer.format_event(&event).unwrap(),
            ":app:test FAILED (4ms): exit 1"
        );
    }

    #[test]
    fn test_summary_counts() {
        let renderer = TextRendererPlugin::new(false);
        let mut report = report(
            vec![
                outcome(":a", TaskState::Failed, Some("boom")),
                outcome(":b", TaskState::Skipped, None),
                outcome(":c", TaskState::Succeeded, None),
            ],
            false,
        );
        report.failures.push(kiln_core::api::TaskFailure {
            path: TaskPath::parse(":a").unwrap(),
            message: "boom".to_string(),
        });
        let event = RenderEvent::BuildEnd {
            build_id: "b1".to_string(),
            report,
        };
        assert_eq!(
            renderer.format_event(&event).unwrap(),
            "BUILD FAILED in 12ms (3 tasks: 1 succeeded, 1 failed, 1 skipped, 0 cancelled)"
        );
    }

    #[test]
    fn test_dry_run_summary_mentions_retained_exclusions() {
        let renderer = TextRendererPlugin::new(false);
        let mut report = report(vec![outcome(":test", TaskState::Skipped, None)], true);
        report.retained_exclusions = vec![TaskPath::parse(":test").unwrap()];
        let text = renderer
            .format_event(&RenderEvent::BuildEnd {
                build_id: "b1".to_string(),
                report,
            })
            .unwrap();
        assert!(text.starts_with("warning: excluded task :test is retained"));
        assert!(text.ends_with("BUILD SUCCESSFUL (dry run, 1 tasks)"));
    }
}
