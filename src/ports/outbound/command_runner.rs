use crate::shared::Result;
use async_trait::async_trait;

/// CommandRunner port for invoking the ecosystem's native package-manager
/// executables (`npm ls --json`, the pipdeptree helper script, `nuget
/// locals global-packages -list`).
///
/// Returns combined stdout/stderr as one line-accessible string, since
/// install-log parsing needs both streams interleaved the way a terminal
/// would see them.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs `program` with `args` in `working_dir` (current dir when
    /// `None`) and captures its combined output.
    ///
    /// # Errors
    /// Returns an error if the process cannot be spawned or exits with a
    /// non-zero status.
    async fn run_captured(
        &self,
        program: &str,
        args: &[String],
        working_dir: Option<&std::path::Path>,
    ) -> Result<String>;
}
