//! Commonality Core Library
//!
//! Session logging and the small pieces of application glue every app
//! ends up needing.
//!
//! ## Overview
//!
//! The heart of the crate is an append-only session logger: each run of
//! an application writes one plain-text session log, and every event,
//! informative message and error report lands in it as one or more
//! timestamped lines, in call order, no matter how many tasks log at once.
//! Logging never fails the caller.
//!
//! Around it sit:
//!
//! - **Clock**: an adjustable clock whose offset survives restarts
//! - **Settings**: a small key/value settings abstraction
//! - **Services**: an explicit registry of shared services
//! - **Presentation**: converters, notifications, commands, observable lists
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use commonality_core::{ErrorReport, FileLogStore, LoggerConfig, SessionLogger};
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = FileLogStore::from_config(&LoggerConfig::default());
//!     let logger = SessionLogger::new(Arc::new(store));
//!
//!     logger.start_session().await;
//!     logger.log_event("Opened", &["realm=inbox"]).await;
//!
//!     if let Err(e) = std::fs::read("missing.cfg") {
//!         logger.log_error(Some("config"), ErrorReport::from_error(&e)).await;
//!     }
//! }
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;
pub mod presentation;
pub mod services;
pub mod settings;

// Re-exports
pub use clock::{Clock, OffsetClock, SystemClock, TimeSource};
pub use config::LoggerConfig;
pub use error::{CoreError, CoreResult};
pub use logging::{
    Entry, ErrorReport, FileLogStore, LogStore, Logger, MemoryLogStore, SessionId, SessionLayer,
    SessionLogger, WriteOutcome,
};
pub use services::ServiceContext;
pub use settings::{MemorySettings, Settings};
