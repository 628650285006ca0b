use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the CLI application.
///
/// These codes allow CI systems to distinguish between different
/// types of failures and successes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success - every dependency was reconciled to a checksum
    Success = 0,
    /// The run completed but some dependencies have no established provenance
    MissingDependencies = 1,
    /// Invalid command-line arguments (clap parsing errors)
    InvalidArguments = 2,
    /// Application error (extraction failure, cache I/O error, etc.)
    ApplicationError = 3,
}

impl ExitCode {
    /// Convert to i32 for use with std::process::exit
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitCode::Success => write!(f, "Success (0)"),
            ExitCode::MissingDependencies => write!(f, "Missing Dependencies (1)"),
            ExitCode::InvalidArguments => write!(f, "Invalid Arguments (2)"),
            ExitCode::ApplicationError => write!(f, "Application Error (3)"),
        }
    }
}

/// Application-specific errors for dependency tracing.
///
/// Uses thiserror to derive Display and Error traits automatically.
/// Structural failures (unparsable metadata, cache corruption) get their
/// own variants because callers must abort on them, while per-dependency
/// misses are accumulated and never surface through this type.
#[derive(Debug, Error)]
pub enum DepTraceError {
    #[error("Failed to parse dependency metadata: {path}\nDetails: {details}")]
    ExtractionParse { path: PathBuf, details: String },

    #[error("The package file {path} doesn't exist in the local package cache and is not reachable in the resolved target graph")]
    MissingPackageArtifact { path: PathBuf },

    #[error("Failed to {operation} the dependency cache: {path}\nDetails: {details}")]
    CacheIo {
        operation: &'static str,
        path: PathBuf,
        details: String,
    },

    #[error("No compatible dependency extractor found for project at: {path}\nHint: expected one of packages.config, project.assets.json, package.json, requirements.txt or setup.py")]
    NoCompatibleExtractor { path: PathBuf },

    #[error("Command '{command}' failed with exit status {status}:\n{stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("Artifact repository query failed: {details}")]
    RepositoryQuery { details: String },
}
