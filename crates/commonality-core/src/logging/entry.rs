//! Log entries and the flat line format they are written in.
//!
//! An entry is one logging call's worth of raw lines. Lines only gain
//! their timestamp prefix inside the write lock, so every line of an
//! entry carries the moment the entry was actually persisted.

use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error as StdError;
use std::fmt;

use chrono::NaiveDateTime;

/// Timestamp layout at the start of every physical line.
pub const LINE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%SZ";

/// Preamble written when a session is created.
pub const CREATED_LINE: &str = "Created";

/// Body of a session-start entry.
pub const STARTED_LINE: &str = "Started";

/// Prefix a raw line with its timestamp.
pub fn format_line(at: NaiveDateTime, raw: &str) -> String {
    format!("{} {}", at.format(LINE_TIMESTAMP_FORMAT), raw)
}

/// Split a formatted line back into its timestamp and body.
pub fn parse_line(line: &str) -> Option<(NaiveDateTime, &str)> {
    let (at, rest) = NaiveDateTime::parse_and_remainder(line, LINE_TIMESTAMP_FORMAT).ok()?;
    Some((at, rest.strip_prefix(' ').unwrap_or(rest)))
}

/// One logical logging call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    /// Application session started
    Started,

    /// Something happened, with optional `key=value` parameters
    Event {
        message: String,
        parameters: Vec<String>,
    },

    /// Informative message, usually detailed
    Info(String),

    /// Error report, optionally filed under an explicit category tag
    Error {
        tag: Option<String>,
        report: ErrorReport,
    },
}

impl Entry {
    /// Create an event entry.
    pub fn event<I, P>(message: impl Into<String>, parameters: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Entry::Event {
            message: message.into(),
            parameters: parameters.into_iter().map(Into::into).collect(),
        }
    }

    /// Create an informative entry.
    pub fn info(message: impl Into<String>) -> Self {
        Entry::Info(message.into())
    }

    /// Create an error entry.
    ///
    /// Without an explicit tag the report's own source tag is used.
    pub fn error(tag: Option<&str>, report: ErrorReport) -> Self {
        Entry::Error {
            tag: tag.map(str::to_string),
            report,
        }
    }

    /// Raw (unstamped) lines, in write order.
    pub fn lines(&self) -> Vec<String> {
        match self {
            Entry::Started => vec![STARTED_LINE.to_string()],
            Entry::Event {
                message,
                parameters,
            } => std::iter::once(format!("Event: {}", message))
                .chain(parameters.iter().map(|p| format!(", {}", p)))
                .collect(),
            Entry::Info(message) => vec![format!("FYI: {}", message)],
            Entry::Error { tag, report } => error_lines(tag.as_deref(), report),
        }
    }
}

fn error_lines(tag: Option<&str>, report: &ErrorReport) -> Vec<String> {
    let shown = tag.or(report.source_tag()).unwrap_or_default();
    let mut lines = vec![format!("Error: {}/{}", shown, report.kind())];

    if let Some(backtrace) = report.backtrace() {
        lines.push(format!(", Stack = {}", backtrace));
    }
    // The header already shows the source tag when no explicit tag was given.
    if let (Some(_), Some(source)) = (tag, report.source_tag()) {
        lines.push(format!(", Source = {}", source));
    }
    for level in report.chain() {
        lines.push(format!(", Message = {} {}", level.kind(), level.message()));
    }
    lines
}

/// An error flattened into what the log needs from it.
///
/// Each level of the cause chain keeps its own kind name and message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    kind: String,
    message: String,
    source_tag: Option<String>,
    backtrace: Option<String>,
    cause: Option<Box<ErrorReport>>,
}

impl ErrorReport {
    /// Create a report from a kind name and message.
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            source_tag: None,
            backtrace: None,
            cause: None,
        }
    }

    /// Build a report from an error value and its `source()` chain.
    ///
    /// The outermost level is named after `E`; inner levels are only
    /// known as trait objects and are named after their `Debug` head.
    pub fn from_error<E: StdError + 'static>(err: &E) -> Self {
        let mut report = Self::new(std::any::type_name::<E>(), err.to_string());
        report.cause = err.source().map(|inner| Box::new(Self::from_dyn(inner)));
        report
    }

    /// Build a report from an error trait object and its `source()` chain.
    pub fn from_dyn(err: &(dyn StdError + 'static)) -> Self {
        let mut report = Self::new(debug_kind(err), err.to_string());
        report.cause = err.source().map(|inner| Box::new(Self::from_dyn(inner)));
        report
    }

    /// Attach the short tag identifying where the error was raised.
    pub fn with_source_tag(mut self, tag: impl Into<String>) -> Self {
        self.source_tag = Some(tag.into());
        self
    }

    /// Attach a rendered stack trace.
    pub fn with_backtrace(mut self, backtrace: impl Into<String>) -> Self {
        self.backtrace = Some(backtrace.into());
        self
    }

    /// Capture the current backtrace, if capturing is enabled
    /// (`RUST_BACKTRACE` / `RUST_LIB_BACKTRACE`).
    pub fn capture_backtrace(self) -> Self {
        let backtrace = Backtrace::capture();
        match backtrace.status() {
            BacktraceStatus::Captured => self.with_backtrace(backtrace.to_string()),
            _ => self,
        }
    }

    /// Set the error that caused this one.
    pub fn caused_by(mut self, cause: ErrorReport) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn source_tag(&self) -> Option<&str> {
        self.source_tag.as_deref()
    }

    pub fn backtrace(&self) -> Option<&str> {
        self.backtrace.as_deref().filter(|b| !b.is_empty())
    }

    pub fn cause(&self) -> Option<&ErrorReport> {
        self.cause.as_deref()
    }

    /// This report followed by its causes, outermost first.
    pub fn chain(&self) -> impl Iterator<Item = &ErrorReport> {
        std::iter::successors(Some(self), |report| report.cause())
    }
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Leading identifier of an error's `Debug` rendering
/// (`Custom { .. }` -> `Custom`, `ParseIntError { .. }` -> `ParseIntError`).
fn debug_kind(err: &(dyn StdError + 'static)) -> String {
    let rendered = format!("{:?}", err);
    let head: String = rendered
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_' || *c == ':')
        .collect();
    if head.is_empty() {
        "Error".to_string()
    } else {
        head
    }
}
