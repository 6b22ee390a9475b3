use std::path::PathBuf;
use std::sync::Arc;

use kiln_core::api::{
    load_project_model, AppConfig, BuildCancellationToken, BuildReport, BuildRequest,
    BuildSession, ProjectPath, BUILD_FILE_NAME,
};
use kiln_plugins::factory::{build_renderer, PluginActionFactory};

use crate::commands::cli::Args;
use crate::error::CliError;

/// Turns parsed arguments into a build request.
pub fn build_request(args: &Args) -> Result<BuildRequest, CliError> {
    let mut request = BuildRequest::from_args(&args.tasks)
        .map_err(kiln_core::api::BuildError::from)?
        .dry_run(args.dry_run);
    for task in &args.exclude {
        request = request.exclude(task.clone());
    }
    if let Some(raw) = &args.start_project {
        let project = ProjectPath::parse(raw).map_err(|e| CliError::Usage(e.to_string()))?;
        request = request.start_project(project);
    }
    Ok(request)
}

fn project_dir(args: &Args) -> Result<PathBuf, CliError> {
    match &args.project_dir {
        Some(dir) => Ok(dir.clone()),
        None => std::env::current_dir()
            .map_err(|e| CliError::Usage(format!("cannot determine working directory: {e}"))),
    }
}

/// Loads `kiln.toml`, runs the requested build and returns its report.
///
/// Selection and graph errors are returned as errors; task failures are in the report.
pub async fn run_build(
    args: &Args,
    mut cfg: AppConfig,
    cancel: BuildCancellationToken,
) -> Result<BuildReport, CliError> {
    args.apply_overrides(&mut cfg.execution);
    let dir = project_dir(args)?;
    let build_file = dir.join(BUILD_FILE_NAME);
    tracing::debug!(build_file = %build_file.display(), "loading project model");
    let model = load_project_model(&build_file, &PluginActionFactory::new(&dir))?;

    let request = build_request(args)?;
    let mut session = BuildSession::new(Arc::new(model), cfg.execution);
    if !args.quiet {
        session = session.with_renderer(build_renderer(args.format.as_str()));
    }
    Ok(session.run(&request, cancel).await?)
}

/// Runs the build and maps its outcome to a process exit code.
pub async fn run_app(
    args: Args,
    cfg: AppConfig,
    cancel: BuildCancellationToken,
) -> Result<i32, CliError> {
    let report = run_build(&args, cfg, cancel).await?;
    report.into_result()?;
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use kiln_core::api::{BuildError, TaskState};

    const BUILD_FILE: &str = r#"
default_tasks = ["build"]

[tasks.build]
depends_on = [":app:assemble", "docs"]

[tasks.docs]
action = { type = "noop" }

[projects.app.tasks.compile]
resources = ["project"]
action = { type = "sleep", millis = 5 }

[projects.app.tasks.assemble]
depends_on = ["compile"]
action = { type = "shell", command = "echo assembled" }

[projects.app.tasks.broken]
action = { type = "fail", message = "broken on purpose" }
"#;

    fn workspace() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(BUILD_FILE_NAME), BUILD_FILE).unwrap();
        dir
    }

    fn args(dir: &tempfile::TempDir, extra: &[&str]) -> Args {
        let mut argv = vec![
            "kiln".to_string(),
            "-q".to_string(),
            "--project-dir".to_string(),
            dir.path().display().to_string(),
        ];
        argv.extend(extra.iter().map(|s| s.to_string()));
        Args::try_parse_from(argv).unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_default_tasks_run() {
        let dir = workspace();
        let report = run_build(&args(&dir, &[]), AppConfig::default(), BuildCancellationToken::new())
            .await
            .unwrap();

        assert!(report.is_success());
        assert_eq!(report.count(TaskState::Succeeded), 4);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_dry_run_with_exclusion() {
        let dir = workspace();
        let report = run_build(
            &args(&dir, &["-m", "-x", "docs", "build"]),
            AppConfig::default(),
            BuildCancellationToken::new(),
        )
        .await
        .unwrap();

        assert!(report.dry_run);
        let paths: Vec<String> = report.tasks.iter().map(|t| t.path.to_string()).collect();
        // :build still needs :docs, so the exclusion is retained
        assert_eq!(paths, vec![":app:compile", ":docs", ":app:assemble", ":build"]);
        assert_eq!(report.retained_exclusions.len(), 1);
        assert_eq!(report.count(TaskState::Skipped), 4);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_failing_task_exit_code() {
        let dir = workspace();
        let err = run_app(args(&dir, &["broken"]), AppConfig::default(), BuildCancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("Execution failed for task ':app:broken': broken on purpose"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_unknown_task_is_a_usage_failure() {
        let dir = workspace();
        let err = run_app(args(&dir, &["deploy"]), AppConfig::default(), BuildCancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, CliError::Build(BuildError::Selection(_))));
        assert_eq!(err.exit_code(), 2);
    }

    #[tokio::test]
    async fn test_missing_build_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_app(args(&dir, &["build"]), AppConfig::default(), BuildCancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.exit_code(), 11);
    }

    #[test]
    fn test_invalid_start_project() {
        let dir = workspace();
        let err = build_request(&args(&dir, &["-p", "app", "build"])).unwrap_err();
        assert!(matches!(err, CliError::Usage(_)));
    }
}
