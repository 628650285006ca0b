use crate::ports::outbound::CommandRunner;
use crate::shared::{DepTraceError, Result};
use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;

/// TokioCommandRunner adapter for invoking package-manager executables.
///
/// This adapter implements the CommandRunner port with `tokio::process`,
/// capturing stdout and stderr together the way a terminal would see
/// them, since package managers split their install logs across both
/// streams. A non-zero exit status is a `CommandFailed` error carrying
/// the captured stderr.
pub struct TokioCommandRunner;

impl TokioCommandRunner {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TokioCommandRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandRunner for TokioCommandRunner {
    async fn run_captured(
        &self,
        program: &str,
        args: &[String],
        working_dir: Option<&Path>,
    ) -> Result<String> {
        let mut command = Command::new(program);
        command.args(args);
        if let Some(dir) = working_dir {
            command.current_dir(dir);
        }
        log::debug!("Running command: {} {}", program, args.join(" "));

        let output = command.output().await.map_err(|e| {
            DepTraceError::CommandFailed {
                command: format!("{} {}", program, args.join(" ")),
                status: "not started".to_string(),
                stderr: e.to_string(),
            }
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            return Err(DepTraceError::CommandFailed {
                command: format!("{} {}", program, args.join(" ")),
                status: output.status.to_string(),
                stderr: stderr.into_owned(),
            }
            .into());
        }

        Ok(format!("{}{}", stdout, stderr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_captures_stdout() {
        let runner = TokioCommandRunner::new();
        let output = runner
            .run_captured("sh", &["-c".to_string(), "echo hello".to_string()], None)
            .await
            .unwrap();
        assert_eq!(output.trim(), "hello");
    }

    #[tokio::test]
    async fn test_captures_stderr_alongside_stdout() {
        let runner = TokioCommandRunner::new();
        let output = runner
            .run_captured(
                "sh",
                &["-c".to_string(), "echo out; echo err >&2".to_string()],
                None,
            )
            .await
            .unwrap();
        assert!(output.contains("out"));
        assert!(output.contains("err"));
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_command_failed() {
        let runner = TokioCommandRunner::new();
        let err = runner
            .run_captured(
                "sh",
                &["-c".to_string(), "echo broken >&2; exit 3".to_string()],
                None,
            )
            .await
            .unwrap_err();
        let failed = err.downcast_ref::<DepTraceError>().unwrap();
        assert!(matches!(failed, DepTraceError::CommandFailed { stderr, .. } if stderr.contains("broken")));
    }

    #[tokio::test]
    async fn test_respects_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        let runner = TokioCommandRunner::new();
        let output = runner
            .run_captured("pwd", &[], Some(dir.path()))
            .await
            .unwrap();
        let reported = std::fs::canonicalize(output.trim()).unwrap();
        let expected = std::fs::canonicalize(dir.path()).unwrap();
        assert_eq!(reported, expected);
    }
}
