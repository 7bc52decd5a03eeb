//! Tracing Layer that forwards application events into the session log.
//!
//! Every event becomes one detached `FYI:` line of the form
//! `[LEVEL target] message key=value ...`.

use std::fmt::Write as FmtWrite;

use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

use super::logger::SessionLogger;

/// Events from the logger's own modules are never forwarded.
const OWN_TARGET: &str = "commonality_core::logging";

/// A tracing Layer that writes events into a session log.
pub struct SessionLayer {
    logger: SessionLogger,
    skipped: Vec<String>,
}

impl SessionLayer {
    pub fn new(logger: SessionLogger) -> Self {
        Self {
            logger,
            skipped: Vec::new(),
        }
    }

    /// Do not forward events from `target` or any module below it.
    pub fn skip_target(mut self, target: impl Into<String>) -> Self {
        self.skipped.push(target.into());
        self
    }

    fn is_skipped(&self, target: &str) -> bool {
        within(target, OWN_TARGET) || self.skipped.iter().any(|skip| within(target, skip))
    }

    /// Get the logger events are forwarded to.
    pub fn logger(&self) -> &SessionLogger {
        &self.logger
    }
}

impl<S> Layer<S> for SessionLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if self.is_skipped(metadata.target()) {
            return;
        }

        let mut visitor = LineVisitor::default();
        event.record(&mut visitor);

        let mut line = format!("[{} {}]", metadata.level(), metadata.target());
        if let Some(message) = visitor.message {
            line.push(' ');
            line.push_str(&message);
        }
        line.push_str(&visitor.fields);

        self.logger.log_info_detached(&line);
    }
}

/// Whether `target` is the module `path` or one nested in it.
fn within(target: &str, path: &str) -> bool {
    match target.strip_prefix(path) {
        Some(rest) => rest.is_empty() || rest.starts_with("::"),
        None => false,
    }
}

/// Collects the message and renders the remaining fields as ` key=value`.
#[derive(Default)]
struct LineVisitor {
    message: Option<String>,
    fields: String,
}

impl Visit for LineVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{:?}", value));
        } else {
            let _ = write!(self.fields, " {}={:?}", field.name(), value);
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            let _ = write!(self.fields, " {}={}", field.name(), value);
        }
    }
}
