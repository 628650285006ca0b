use crate::ports::outbound::ProgressReporter;

/// StderrProgressReporter adapter for user-facing phase messages.
///
/// This adapter implements the ProgressReporter port, writing to stderr
/// so it doesn't interfere with the JSON tree on stdout.
pub struct StderrProgressReporter;

impl StderrProgressReporter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StderrProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for StderrProgressReporter {
    fn report(&self, message: &str) {
        eprintln!("{}", message);
    }

    fn warn(&self, message: &str) {
        eprintln!("[Warn] {}", message);
    }
}
