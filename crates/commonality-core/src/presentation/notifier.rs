//! Change and message notifications for presentation models.
//!
//! A model owns a [`Notifier`] and calls it when a property changes, when
//! it has a message for the user, or when something failed. Views
//! subscribe and receive every notification sent after they subscribed.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::logging::{Entry, ErrorReport, Logger};
use crate::services::ServiceContext;

const CHANNEL_CAPACITY: usize = 64;

/// Something a view may want to react to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// A property's value changed
    PropertyChanged(String),

    /// A user-facing message, ready to display as-is
    Message(String),

    /// An operation failed
    Error(ErrorReport),
}

/// Broadcasts notifications to any number of subscribers.
pub struct Notifier {
    tx: broadcast::Sender<Notification>,
    logger: Option<Arc<dyn Logger>>,
}

impl Notifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx, logger: None }
    }

    /// Also report errors to `logger`.
    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Notifier reporting errors to the logger registered in `services`, if any.
    pub fn from_services(services: &ServiceContext) -> Self {
        let notifier = Self::new();
        match services.try_get::<dyn Logger>() {
            Some(logger) => notifier.with_logger(logger),
            None => notifier,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }

    pub fn set_property(&self, name: &str) {
        self.send(Notification::PropertyChanged(name.to_string()));
    }

    pub fn set_message(&self, message: &str) {
        self.send(Notification::Message(message.to_string()));
    }

    /// Notify subscribers of a failure and log it.
    pub fn set_error(&self, report: ErrorReport) {
        self.send(Notification::Error(report.clone()));

        if let Some(logger) = &self.logger {
            logger.log_detached(Entry::error(None, report));
        }
    }

    /// Like [`Notifier::set_error`], filing the error under `source`.
    pub fn set_error_from(&self, source: &str, report: ErrorReport) {
        self.set_error(report.with_source_tag(source));
    }

    fn send(&self, notification: Notification) {
        // No subscribers is fine.
        let _ = self.tx.send(notification);
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}
