//! Logging infrastructure for structured console and file output.

mod logger;
mod record;
mod run_log;
mod subscriber;
mod types;

pub use logger::Logger;
pub use run_log::log_file_for;
pub use subscriber::init_subscriber;
pub use types::{Log, PhaseEntry, PhaseStatus};

/// Create a Logger whose events reach a run log in a fresh temp dir, through
/// a per-thread subscriber holding only the [`FileLayer`](subscriber::FileLayer).
///
/// The returned guard must be kept alive for the duration of the test.
#[cfg(test)]
#[allow(clippy::expect_used)]
pub(crate) fn isolated_logger() -> (Logger, tempfile::TempDir, tracing::dispatcher::DefaultGuard) {
    use tracing_subscriber::{Layer as _, filter::LevelFilter, layer::SubscriberExt as _};
    let tmp = tempfile::tempdir().expect("failed to create temp dir");
    let path = tmp.path().join("recon").join("test.log");
    let file_layer = subscriber::FileLayer::create(&path, "test").expect("open run log");
    let subscriber =
        tracing_subscriber::registry().with(file_layer.with_filter(LevelFilter::DEBUG));
    let guard = tracing::dispatcher::set_default(&tracing::Dispatch::new(subscriber));
    (Logger::new(Some(path)), tmp, guard)
}

/// [`Log`] double that records every message in memory.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct CaptureLog {
    lines: std::sync::Mutex<Vec<String>>,
    phases: std::sync::Mutex<Vec<PhaseEntry>>,
}

#[cfg(test)]
impl CaptureLog {
    /// Every message logged so far, prefixed with its level.
    pub(crate) fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .map_or_else(|_| Vec::new(), |g| g.clone())
    }

    /// Whether any message contains `needle`.
    pub(crate) fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|l| l.contains(needle))
    }

    /// Every recorded phase.
    pub(crate) fn phases(&self) -> Vec<PhaseEntry> {
        self.phases
            .lock()
            .map_or_else(|_| Vec::new(), |g| g.clone())
    }

    fn push(&self, level: &str, msg: &str) {
        if let Ok(mut guard) = self.lines.lock() {
            guard.push(format!("{level}: {msg}"));
        }
    }
}

#[cfg(test)]
impl Log for CaptureLog {
    fn stage(&self, msg: &str) {
        self.push("stage", msg);
    }
    fn info(&self, msg: &str) {
        self.push("info", msg);
    }
    fn debug(&self, msg: &str) {
        self.push("debug", msg);
    }
    fn warn(&self, msg: &str) {
        self.push("warn", msg);
    }
    fn error(&self, msg: &str) {
        self.push("error", msg);
    }
    fn record_phase(&self, name: &str, status: PhaseStatus, message: Option<&str>) {
        if let Ok(mut guard) = self.phases.lock() {
            guard.push(PhaseEntry {
                name: name.to_string(),
                status,
                message: message.map(String::from),
            });
        }
    }
}
