//! The session logger.
//!
//! Every write, awaited or detached, is queued at the call site onto one
//! FIFO channel drained by a single writer, so entries land in the order
//! they were issued. The first write creates the session and its
//! `Created` preamble in the same step, so nothing can land between them.
//! Persistence failures never reach the caller: this is the error path of
//! last resort, so a failed write is reported as
//! [`WriteOutcome::Dropped`] and traced, and that is all.
//!
//! ```ignore
//! let logger = SessionLogger::new(Arc::new(FileLogStore::new(home)));
//! logger.start_session().await;
//!
//! // Detached: returns immediately, the write happens in the background.
//! logger.log_event_detached("Sync", &["realm=inbox"]);
//! logger.wait().await;
//! ```

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::sync::{mpsc, oneshot, Mutex};

use super::entry::{format_line, Entry, ErrorReport, CREATED_LINE};
use super::gate::{GateGuard, WaitGate};
use super::session_id::SessionId;
use super::store::LogStore;
use crate::clock::Clock;
use crate::services::ServiceContext;

/// Result of a write attempt. Logging never fails; it either wrote or dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The entry's lines were persisted
    Written { session: SessionId, lines: usize },

    /// The entry was lost; the reason has already been traced
    Dropped { reason: String },
}

impl WriteOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self, WriteOutcome::Written { .. })
    }
}

/// A service that logs events and errors.
#[async_trait]
pub trait Logger: Send + Sync {
    /// Write an entry and wait for the attempt to finish.
    async fn log(&self, entry: Entry) -> WriteOutcome;

    /// Schedule an entry for writing and return immediately.
    fn log_detached(&self, entry: Entry);
}

/// Append-only logger writing every entry into one session.
#[derive(Clone)]
pub struct SessionLogger {
    inner: Arc<Inner>,
}

struct Inner {
    state: Arc<WriterState>,
    /// Sending half of the write queue, opened by the first write.
    queue: OnceLock<mpsc::UnboundedSender<Job>>,
    gate: WaitGate,
    runtime: Option<Handle>,
}

/// Everything the writer needs. Owned jointly by the logger and its writer.
struct WriterState {
    store: Arc<dyn LogStore>,
    clock: Option<Arc<dyn Clock>>,
    /// Holds the session id once the session exists.
    session: Mutex<Option<SessionId>>,
}

/// One queued entry.
struct Job {
    lines: Vec<String>,
    reply: Option<oneshot::Sender<WriteOutcome>>,
    _hold: Option<GateGuard>,
}

/// Builder for [`SessionLogger`].
pub struct SessionLoggerBuilder {
    store: Arc<dyn LogStore>,
    clock: Option<Arc<dyn Clock>>,
    runtime: Option<Handle>,
}

impl SessionLoggerBuilder {
    /// Stamp lines with `clock` instead of local system time.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Pick up the clock registered in `services`, if any.
    pub fn services(mut self, services: &ServiceContext) -> Self {
        if let Some(clock) = services.try_get::<dyn Clock>() {
            self.clock = Some(clock);
        }
        self
    }

    /// Run the writer on `runtime`.
    ///
    /// Defaults to the runtime the logger is built in, if any.
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn build(self) -> SessionLogger {
        let runtime = self.runtime.or_else(usable_runtime);

        SessionLogger {
            inner: Arc::new(Inner {
                state: Arc::new(WriterState {
                    store: self.store,
                    clock: self.clock,
                    session: Mutex::new(None),
                }),
                queue: OnceLock::new(),
                gate: WaitGate::new(),
                runtime,
            }),
        }
    }
}

impl SessionLogger {
    /// Logger over `store`, stamped with local system time.
    pub fn new(store: Arc<dyn LogStore>) -> Self {
        Self::builder(store).build()
    }

    pub fn builder(store: Arc<dyn LogStore>) -> SessionLoggerBuilder {
        SessionLoggerBuilder {
            store,
            clock: None,
            runtime: None,
        }
    }

    /// Get the backing store, e.g. to read a session back.
    pub fn store(&self) -> &Arc<dyn LogStore> {
        &self.inner.state.store
    }

    /// The current session, once the first write has created it.
    ///
    /// Waits for a write that is in progress, but not for queued ones.
    pub async fn session(&self) -> Option<SessionId> {
        *self.inner.state.session.lock().await
    }

    /// Begin the logging session. Call once when the app starts.
    pub async fn start_session(&self) -> WriteOutcome {
        self.log(Entry::Started).await
    }

    pub fn start_session_detached(&self) {
        self.log_detached(Entry::Started);
    }

    /// Log an event with optional `key=value` parameters.
    pub async fn log_event(&self, message: &str, parameters: &[&str]) -> WriteOutcome {
        self.log(Entry::event(message, parameters.iter().copied())).await
    }

    pub fn log_event_detached(&self, message: &str, parameters: &[&str]) {
        self.log_detached(Entry::event(message, parameters.iter().copied()));
    }

    /// Report an error, under `tag` or else the report's own source tag.
    pub async fn log_error(&self, tag: Option<&str>, report: ErrorReport) -> WriteOutcome {
        self.log(Entry::error(tag, report)).await
    }

    pub fn log_error_detached(&self, tag: Option<&str>, report: ErrorReport) {
        self.log_detached(Entry::error(tag, report));
    }

    /// Log an informative message.
    pub async fn log_info(&self, message: &str) -> WriteOutcome {
        self.log(Entry::info(message)).await
    }

    pub fn log_info_detached(&self, message: &str) {
        self.log_detached(Entry::info(message));
    }

    /// Write an entry and wait for the attempt to finish.
    pub async fn log(&self, entry: Entry) -> WriteOutcome {
        let (reply, outcome) = oneshot::channel();
        let job = Job {
            lines: entry.lines(),
            reply: Some(reply),
            _hold: None,
        };
        if !self.inner.enqueue(job) {
            return dropped(None, "cannot queue entry", "log writer stopped");
        }

        match outcome.await {
            Ok(outcome) => outcome,
            Err(e) => dropped(None, "log writer stopped", e),
        }
    }

    /// Queue an entry for writing and return without waiting on I/O.
    ///
    /// Entries are written in the order they were queued. Use
    /// [`SessionLogger::wait`] to find out when they have been written.
    pub fn log_detached(&self, entry: Entry) {
        let job = Job {
            lines: entry.lines(),
            reply: None,
            _hold: Some(self.inner.gate.hold()),
        };
        if !self.inner.enqueue(job) {
            tracing::warn!("log write dropped: log writer stopped");
        }
    }

    /// Wait until every detached write issued so far has finished.
    pub async fn wait(&self) {
        self.inner.gate.wait().await;
    }
}

#[async_trait]
impl Logger for SessionLogger {
    async fn log(&self, entry: Entry) -> WriteOutcome {
        SessionLogger::log(self, entry).await
    }

    fn log_detached(&self, entry: Entry) {
        SessionLogger::log_detached(self, entry);
    }
}

/// A runtime that keeps making progress on its own.
///
/// A current-thread runtime only runs while its owner blocks on it, so it
/// cannot host the writer.
fn usable_runtime() -> Option<Handle> {
    Handle::try_current()
        .ok()
        .filter(|h| h.runtime_flavor() != RuntimeFlavor::CurrentThread)
}

impl Inner {
    /// Queue `job` behind everything queued before it.
    ///
    /// Returns false when the writer is gone; the job, and any gate hold it
    /// carries, is dropped.
    fn enqueue(&self, job: Job) -> bool {
        self.queue
            .get_or_init(|| self.start_writer())
            .send(job)
            .is_ok()
    }

    fn start_writer(&self) -> mpsc::UnboundedSender<Job> {
        let (queue, jobs) = mpsc::unbounded_channel();
        let state = self.state.clone();

        if let Some(runtime) = self.runtime.clone().or_else(usable_runtime) {
            runtime.spawn(state.drain(jobs));
            return queue;
        }

        // No runtime to lean on: one dedicated thread serves this logger
        // until the last handle is dropped.
        let spawned = std::thread::Builder::new()
            .name("session-log-writer".into())
            .spawn(move || {
                match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(rt) => rt.block_on(state.drain(jobs)),
                    Err(e) => tracing::warn!(error = %e, "log writer not started: no runtime"),
                }
            });
        if let Err(e) = spawned {
            tracing::warn!(error = %e, "log writer not started: cannot spawn thread");
        }
        queue
    }
}

impl WriterState {
    fn now(&self) -> NaiveDateTime {
        match &self.clock {
            Some(clock) => clock.now(),
            None => Local::now().naive_local(),
        }
    }

    /// Write queued jobs one at a time until every sender is gone.
    async fn drain(self: Arc<Self>, mut jobs: mpsc::UnboundedReceiver<Job>) {
        while let Some(job) = jobs.recv().await {
            let outcome = self.write(job.lines).await;
            if let Some(reply) = job.reply {
                let _ = reply.send(outcome);
            }
        }
        tracing::trace!("log writer stopped");
    }

    async fn write(&self, lines: Vec<String>) -> WriteOutcome {
        let mut session = self.session.lock().await;
        // One reading per entry: it names a new session and stamps every line.
        let now = self.now();

        let id = match *session {
            Some(id) => id,
            None => {
                let id = match SessionId::from_datetime(now) {
                    Ok(id) => id,
                    Err(e) => return dropped(None, "cannot name session", e),
                };
                *session = Some(id);
                tracing::debug!(session = %id, "created logging session");

                if let Err(e) = self.store.create(id, format_line(now, CREATED_LINE)).await {
                    // Keep going: appending may still bring the session into being.
                    tracing::warn!(session = %id, error = %e, "session preamble dropped");
                }
                id
            }
        };

        let count = lines.len();
        let formatted = lines.iter().map(|line| format_line(now, line)).collect();
        match self.store.append(id, formatted).await {
            Ok(()) => WriteOutcome::Written {
                session: id,
                lines: count,
            },
            Err(e) => dropped(Some(id), "cannot append entry", e),
        }
    }
}

fn dropped(session: Option<SessionId>, what: &str, error: impl std::fmt::Display) -> WriteOutcome {
    let reason = format!("{}: {}", what, error);
    match session {
        Some(id) => tracing::warn!(session = %id, %reason, "log write dropped"),
        None => tracing::warn!(%reason, "log write dropped"),
    }
    WriteOutcome::Dropped { reason }
}
