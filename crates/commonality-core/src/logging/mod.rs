//! Append-only session logging.
//!
//! Each application run writes one session: a plain-text file named after
//! the moment the session was created, holding one timestamped line per
//! physical log line.
//!
//! ## Layout
//!
//! ```text
//! ~/.commonality/
//! └── Logs/
//!     ├── 08d5918cb7545700.txt      # one file per session, hex tick count
//!     └── 08d5919a1c2e0000.txt
//! ```
//!
//! ```text
//! 2018-03-24 13:39:50Z Created
//! 2018-03-24 13:39:50Z Started
//! 2018-03-24 13:39:51Z Event: Hello
//! 2018-03-24 13:39:51Z , AAA=BBB
//! 2018-03-24 13:40:02Z Error: ABC/Exception
//! 2018-03-24 13:40:02Z , Message = Exception FAILED
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use commonality_core::logging::{FileLogStore, SessionLayer, SessionLogger};
//! use tracing_subscriber::prelude::*;
//!
//! let logger = SessionLogger::new(Arc::new(FileLogStore::new(home)));
//! logger.start_session().await;
//!
//! // Forward application tracing events into the session as well
//! tracing_subscriber::registry()
//!     .with(SessionLayer::new(logger.clone()))
//!     .with(tracing_subscriber::fmt::layer())
//!     .init();
//! ```

pub mod entry;
pub mod gate;
pub mod layer;
pub mod logger;
pub mod report;
pub mod session_id;
pub mod store;
pub mod writer;

pub use entry::{format_line, parse_line, Entry, ErrorReport, LINE_TIMESTAMP_FORMAT};
pub use gate::{GateGuard, WaitGate};
pub use layer::SessionLayer;
pub use logger::{Logger, SessionLogger, SessionLoggerBuilder, WriteOutcome};
pub use report::{render_report, summarize, SessionSummary};
pub use session_id::SessionId;
pub use store::{LogStore, MemoryLogStore};
pub use writer::FileLogStore;
