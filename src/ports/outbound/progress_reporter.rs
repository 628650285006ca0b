/// ProgressReporter port for user-facing phase and warning messages.
///
/// Detail-level diagnostics go through the `log` facade instead; this
/// port carries only what an operator should see on a normal run, such as
/// the consolidated missing-dependencies warning.
pub trait ProgressReporter: Send + Sync {
    /// Reports a progress message for the current phase.
    fn report(&self, message: &str);

    /// Reports a warning that should be visible without verbose logging.
    fn warn(&self, message: &str);
}
