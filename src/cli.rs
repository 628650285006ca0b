use clap::Parser;

/// Trace a project's resolved dependency graph and reconcile each
/// dependency against an artifact repository
#[derive(Parser, Debug)]
#[command(name = "deptrace")]
#[command(version)]
#[command(
    about = "Trace package-manager dependency graphs and reconcile checksums against an artifact repository",
    long_about = None
)]
pub struct Args {
    /// Path to the project directory (defaults to current directory)
    #[arg(short, long)]
    pub path: Option<String>,

    /// Target repository name for checksum queries (overrides config file)
    #[arg(short, long)]
    pub repository: Option<String>,

    /// Artifact server base URL (overrides config file)
    #[arg(short, long)]
    pub server_url: Option<String>,

    /// Access token for the artifact server
    #[arg(long)]
    pub access_token: Option<String>,

    /// Worker threads for repository queries
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// Per-query timeout in seconds
    #[arg(long)]
    pub query_timeout_secs: Option<u64>,

    /// Run the package manager's install command before extraction,
    /// capturing its output for download detection
    #[arg(long)]
    pub install: bool,

    /// Read a previously captured install log from this file instead of
    /// running the install
    #[arg(long, value_name = "FILE")]
    pub install_log: Option<String>,

    /// Output file for the JSON dependency tree (stdout when omitted)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Arguments forwarded to the package manager's install command,
    /// after `--` (e.g. `-- -r requirements.txt`)
    #[arg(last = true)]
    pub install_args: Vec<String>,
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
