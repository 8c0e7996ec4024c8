//! Core logging types: phase entries, status, and the [`Log`] trait.

/// Phase execution result for summary reporting.
#[derive(Debug, Clone)]
pub struct PhaseEntry {
    /// Human-readable phase name.
    pub name: String,
    /// Final status of the phase.
    pub status: PhaseStatus,
    /// Optional detail message (counts, skip reason, or error description).
    pub message: Option<String>,
}

/// Status of a completed sync phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseStatus {
    /// Phase completed successfully.
    Ok,
    /// Phase did not run (e.g. nothing to do, or the user declined).
    Skipped,
    /// Phase encountered an error and aborted the run.
    Failed,
}

impl PhaseStatus {
    /// Lowercase word used in the run log.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        }
    }

    /// Inverse of [`label`](Self::label).
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        [Self::Ok, Self::Skipped, Self::Failed]
            .into_iter()
            .find(|status| status.label() == label)
    }
}

/// Abstraction over logging backends.
///
/// [`Logger`](super::logger::Logger) is the production implementation; engine
/// code only sees `&dyn Log`, so tests can capture messages instead.
pub trait Log: Send + Sync {
    /// Log a stage header (major section).
    fn stage(&self, msg: &str);
    /// Log an informational message.
    fn info(&self, msg: &str);
    /// Log a debug message (suppressed on console unless verbose).
    fn debug(&self, msg: &str);
    /// Log a warning message.
    fn warn(&self, msg: &str);
    /// Log an error message.
    fn error(&self, msg: &str);
    /// Record a phase result for the run summary.
    fn record_phase(&self, name: &str, status: PhaseStatus, message: Option<&str>);
}
