//! One tracing event as recon renders it, on the console and in the run log.
use chrono::{DateTime, Utc};
use std::fmt::{self, Write as _};
use tracing::Level;
use tracing::field::{Field, Visit};

use super::types::PhaseStatus;

/// Tracing target used for stage headers.
pub(super) const STAGE_TARGET: &str = "recon::stage";

/// Tracing target used for summary lines; the event carries a `status` field.
pub(super) const PHASE_TARGET: &str = "recon::phase";

/// How an event is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Kind {
    Stage,
    Phase(PhaseStatus),
    Message,
}

/// A tracing event reduced to what recon prints.
#[derive(Debug)]
pub(super) struct Record {
    level: Level,
    kind: Kind,
    message: String,
    /// Structured fields other than `message` and `status`, in emission order.
    fields: Vec<(&'static str, String)>,
}

#[derive(Default)]
struct RecordVisitor {
    message: String,
    status: Option<PhaseStatus>,
    fields: Vec<(&'static str, String)>,
}

impl Visit for RecordVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "message" => self.message = value.to_string(),
            "status" => self.status = PhaseStatus::from_label(value),
            name => self.fields.push((name, value.to_string())),
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        let value = format!("{value:?}");
        match field.name() {
            "message" => self.message = value,
            name => self.fields.push((name, value)),
        }
    }
}

const fn phase_style(status: PhaseStatus) -> (&'static str, &'static str) {
    match status {
        PhaseStatus::Ok => ("✓", "\x1b[32m"),
        PhaseStatus::Skipped => ("○", "\x1b[33m"),
        PhaseStatus::Failed => ("✗", "\x1b[31m"),
    }
}

impl Record {
    pub(super) fn from_event(event: &tracing::Event<'_>) -> Self {
        let mut visitor = RecordVisitor::default();
        event.record(&mut visitor);
        let metadata = event.metadata();
        let kind = match metadata.target() {
            STAGE_TARGET => Kind::Stage,
            PHASE_TARGET => visitor.status.map_or(Kind::Message, Kind::Phase),
            _ => Kind::Message,
        };
        Self {
            level: *metadata.level(),
            kind,
            message: visitor.message,
            fields: visitor.fields,
        }
    }

    fn field_suffix(&self) -> String {
        self.fields
            .iter()
            .fold(String::new(), |mut out, (name, value)| {
                let _ = write!(out, " {name}={value}");
                out
            })
    }

    /// Coloured console line, without the trailing newline.
    pub(super) fn console_line(&self) -> String {
        let msg = &self.message;
        let fields = self.field_suffix();
        match (self.kind, self.level) {
            (_, Level::ERROR) => format!("\x1b[31mERROR\x1b[0m {msg}{fields}"),
            (_, Level::WARN) => format!("\x1b[33mWARN\x1b[0m  {msg}{fields}"),
            (Kind::Stage, _) => format!("\x1b[1;34m==>\x1b[0m \x1b[1m{msg}\x1b[0m"),
            (Kind::Phase(status), _) => {
                let (icon, color) = phase_style(status);
                format!("  {color}{icon} {msg}\x1b[0m")
            }
            (Kind::Message, Level::INFO) => format!("  {msg}{fields}"),
            (Kind::Message, _) => format!("  \x1b[2m{msg}{fields}\x1b[0m"),
        }
    }

    /// Plain run-log line stamped with `at`.
    pub(super) fn file_line(&self, at: DateTime<Utc>) -> String {
        let tag = match (self.kind, self.level) {
            (Kind::Stage, _) => "==>",
            (Kind::Phase(status), _) => status.label(),
            (_, Level::ERROR) => "error",
            (_, Level::WARN) => "warn",
            (_, Level::INFO) => "info",
            _ => "debug",
        };
        let ts = at.format("%H:%M:%S");
        format!("{ts} {tag:<7} {}{}", self.message, self.field_suffix())
    }
}
