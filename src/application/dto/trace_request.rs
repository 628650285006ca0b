use std::path::PathBuf;

/// Request DTO for the dependency tracing use case.
#[derive(Debug, Clone)]
pub struct TraceRequest {
    /// Project root directory, probed for ecosystem marker files.
    pub project_path: PathBuf,
    /// Arguments for the package manager's install command. Also
    /// consulted for flags that change extraction (`-r`, `--production`,
    /// `--verbose`).
    pub install_args: Vec<String>,
    /// Run the package manager install before extraction, capturing its
    /// output for download detection.
    pub run_install: bool,
    /// Pre-captured install output to parse instead of running the
    /// install. Takes precedence over `run_install`.
    pub install_log: Option<String>,
}

impl TraceRequest {
    pub fn new(project_path: impl Into<PathBuf>) -> Self {
        Self {
            project_path: project_path.into(),
            install_args: Vec::new(),
            run_install: false,
            install_log: None,
        }
    }

    pub fn with_install_args(mut self, args: Vec<String>) -> Self {
        self.install_args = args;
        self
    }

    pub fn with_run_install(mut self, run_install: bool) -> Self {
        self.run_install = run_install;
        self
    }

    pub fn with_install_log(mut self, log: Option<String>) -> Self {
        self.install_log = log;
        self
    }
}
