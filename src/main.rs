use deptrace::cli::Args;
use deptrace::config;
use deptrace::prelude::*;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() {
    env_logger::init();

    match run().await {
        Ok(exit_code) => process::exit(exit_code.as_i32()),
        Err(e) => {
            eprintln!("\n❌ An error occurred:\n");
            eprintln!("{}", e);

            // Display error chain
            let mut source = e.source();
            while let Some(err) = source {
                eprintln!("\nCaused by: {}", err);
                source = err.source();
            }

            eprintln!();
            process::exit(ExitCode::ApplicationError.as_i32());
        }
    }
}

async fn run() -> Result<ExitCode> {
    // Parse command-line arguments (clap exits with code 2 on bad flags,
    // matching ExitCode::InvalidArguments).
    let args = Args::parse_args();

    // Validate project directory
    let project_dir = args.path.as_deref().unwrap_or(".");
    let project_path = PathBuf::from(project_dir);
    validate_project_path(&project_path)?;

    // Merge CLI flags over the project config file
    let file_config = config::discover_config(&project_path)?.unwrap_or_default();
    let repository = args
        .repository
        .or(file_config.repository)
        .ok_or_else(|| anyhow::anyhow!(
            "No target repository configured. Pass --repository or set 'repository' in deptrace.config.yml."
        ))?;
    let server_url = args
        .server_url
        .or(file_config.server_url)
        .ok_or_else(|| anyhow::anyhow!(
            "No artifact server configured. Pass --server-url or set 'server_url' in deptrace.config.yml."
        ))?;
    let access_token = args.access_token.or(file_config.access_token);
    let threads = args
        .threads
        .or(file_config.threads)
        .unwrap_or(config::DEFAULT_THREADS);
    let query_timeout = Duration::from_secs(
        args.query_timeout_secs
            .or(file_config.query_timeout_secs)
            .unwrap_or(config::DEFAULT_QUERY_TIMEOUT_SECS),
    );

    // Create adapters (Dependency Injection)
    let runner = Arc::new(TokioCommandRunner::new());
    let artifact_repository = Arc::new(AqlArtifactRepository::new(server_url, access_token)?);
    let cache = Arc::new(FileCacheStore::new(&project_path));
    let progress_reporter = StderrProgressReporter::new();

    // Create use case with injected dependencies
    let use_case = TraceDependenciesUseCase::new(
        runner,
        artifact_repository,
        cache,
        progress_reporter,
        repository,
        threads,
        query_timeout,
    );

    // Create request
    let install_log = match &args.install_log {
        Some(path) => Some(std::fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!("Failed to read install log {}: {}", path, e)
        })?),
        None => None,
    };
    let request = TraceRequest::new(project_path)
        .with_install_args(args.install_args)
        .with_run_install(args.install)
        .with_install_log(install_log);

    // Execute use case
    let response = use_case.execute(request).await?;

    // Present the tree
    let tree_json = response.tree_json()?;
    match &args.output {
        Some(path) => std::fs::write(path, tree_json)
            .map_err(|e| anyhow::anyhow!("Failed to write output file {}: {}", path, e))?,
        None => println!("{}", tree_json),
    }

    if response.has_missing() {
        return Ok(ExitCode::MissingDependencies);
    }
    Ok(ExitCode::Success)
}

fn validate_project_path(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("Project path does not exist: {}", path.display());
    }
    if !path.is_dir() {
        anyhow::bail!("Project path is not a directory: {}", path.display());
    }
    Ok(())
}
