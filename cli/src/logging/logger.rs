//! Structured logger with phase summary collection.
use std::path::PathBuf;
use std::sync::Mutex;

use super::record::{PHASE_TARGET, STAGE_TARGET};
use super::types::{Log, PhaseEntry, PhaseStatus};

/// Implement the display methods of [`Log`] by delegating to inherent methods
/// of the same name on the implementing type.
macro_rules! forward_log_methods {
    ($($method:ident),+ $(,)?) => {
        $(
            fn $method(&self, msg: &str) {
                self.$method(msg);
            }
        )+
    };
}

/// Structured logger with phase summary collection.
///
/// Every message is routed through [`tracing`]; the subscriber installed by
/// [`init_subscriber`](super::subscriber::init_subscriber) writes it to the
/// console and to the run log.
#[derive(Debug)]
pub struct Logger {
    phases: Mutex<Vec<PhaseEntry>>,
    log_file: Option<PathBuf>,
}

impl Logger {
    /// Create a new logger.
    ///
    /// `log_file` is the run log the subscriber writes to, shown at the end
    /// of the summary.
    #[must_use]
    pub const fn new(log_file: Option<PathBuf>) -> Self {
        Self {
            phases: Mutex::new(Vec::new()),
            log_file,
        }
    }

    /// Return the log file path, if available.
    #[must_use]
    pub const fn log_path(&self) -> Option<&PathBuf> {
        self.log_file.as_ref()
    }

    /// Return a clone of all recorded phase entries.
    #[must_use]
    pub fn phase_entries(&self) -> Vec<PhaseEntry> {
        self.phases.lock().map_or_else(|_| vec![], |g| g.clone())
    }

    /// Log an error message.
    pub fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }

    /// Log a warning message.
    pub fn warn(&self, msg: &str) {
        tracing::warn!("{msg}");
    }

    /// Log a stage header (major section).
    pub fn stage(&self, msg: &str) {
        tracing::info!(target: STAGE_TARGET, "{msg}");
    }

    /// Log an informational message.
    pub fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    /// Log a debug message.
    pub fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }

    /// Record a phase result for the summary.
    pub fn record_phase(&self, name: &str, status: PhaseStatus, message: Option<&str>) {
        if let Ok(mut guard) = self.phases.lock() {
            guard.push(PhaseEntry {
                name: name.to_string(),
                status,
                message: message.map(String::from),
            });
        }
    }

    /// Count the number of failed phases.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.phases.lock().map_or(0, |guard| {
            guard
                .iter()
                .filter(|p| p.status == PhaseStatus::Failed)
                .count()
        })
    }

    /// Print the summary of all recorded phases.
    pub fn print_summary(&self) {
        let phases = self.phase_entries();
        if phases.is_empty() {
            return;
        }

        self.stage("Summary");
        for phase in &phases {
            let line = phase.message.as_ref().map_or_else(
                || phase.name.clone(),
                |msg| format!("{} ({msg})", phase.name),
            );
            tracing::info!(target: PHASE_TARGET, status = phase.status.label(), "{line}");
        }

        let count = |status: PhaseStatus| phases.iter().filter(|p| p.status == status).count();
        let ok = count(PhaseStatus::Ok);
        let skipped = count(PhaseStatus::Skipped);
        let failed = count(PhaseStatus::Failed);
        let total = phases.len();
        self.info(&format!(
            "{total} phases: {ok} ok, {skipped} skipped, {failed} failed"
        ));

        if let Some(path) = &self.log_file {
            self.info(&format!("log: {}", path.display()));
        }
    }
}

impl Log for Logger {
    forward_log_methods!(stage, info, debug, warn, error);

    fn record_phase(&self, name: &str, status: PhaseStatus, message: Option<&str>) {
        self.record_phase(name, status, message);
    }
}
