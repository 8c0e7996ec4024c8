//! Tracing subscriber setup: console formatter, run-log layer, and initialisation.
use std::fs;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::record::Record;
use super::run_log;

/// A [`tracing_subscriber::Layer`] that appends every event to the run log.
///
/// Always captures events at `DEBUG` level and above regardless of the
/// console verbosity setting.
#[derive(Debug)]
pub(super) struct FileLayer {
    file: Mutex<fs::File>,
}

impl FileLayer {
    /// Start the run log for `command` at `path`, keeping the previous run.
    pub(super) fn create(path: &Path, command: &str) -> io::Result<Self> {
        let header = run_log::header(command, chrono::Utc::now());
        let file = run_log::start(path, &header)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for FileLayer {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let line = Record::from_event(event).file_line(chrono::Utc::now());
        if let Ok(mut f) = self.file.lock() {
            writeln!(f, "{line}").ok();
        }
    }
}

/// Console output in recon's style; see [`Record::console_line`].
struct ConsoleFormat;

impl<S, N> tracing_subscriber::fmt::FormatEvent<S, N> for ConsoleFormat
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    N: for<'a> tracing_subscriber::fmt::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: tracing_subscriber::fmt::format::Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        writeln!(writer, "{}", Record::from_event(event).console_line())
    }
}

/// Initialise the global [`tracing`] subscriber and return the run log in use.
///
/// Console output goes to stdout (INFO) and stderr (WARN and above). When
/// `log_file` is given, every event including `debug` is also written there;
/// if it cannot be opened the run continues with a warning and `None` is
/// returned. Must be called once at program startup, before any logging.
pub fn init_subscriber(verbose: bool, command: &str, log_file: Option<PathBuf>) -> Option<PathBuf> {
    use tracing_subscriber::fmt::writer::MakeWriterExt as _;
    use tracing_subscriber::{
        Layer as _, filter::LevelFilter, fmt, layer::SubscriberExt as _,
        util::SubscriberInitExt as _,
    };

    let console_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };

    let make_writer = io::stderr
        .with_max_level(tracing::Level::WARN)
        .and(io::stdout.with_min_level(tracing::Level::INFO));

    let console_layer = fmt::layer()
        .event_format(ConsoleFormat)
        .with_writer(make_writer)
        .with_filter(console_level);

    let (file_layer, failure) = match &log_file {
        Some(path) => match FileLayer::create(path, command) {
            Ok(layer) => (Some(layer.with_filter(LevelFilter::DEBUG)), None),
            Err(e) => (None, Some(e)),
        },
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();

    match (log_file, failure) {
        (Some(path), Some(e)) => {
            tracing::warn!("cannot write run log {}: {e}", path.display());
            None
        }
        (log_file, _) => log_file,
    }
}
