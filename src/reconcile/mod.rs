/// Checksum reconciliation: matching extracted dependencies to the files
/// actually materialized during installation and attaching their
/// repository checksums, with a per-project cache as fallback.
pub mod install_log;
pub mod reconciler;

pub use install_log::{is_verbose, InstallLogParser};
pub use reconciler::{ChecksumReconciler, QuerySpec, ReconcileOutcome};
