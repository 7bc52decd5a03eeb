//! Session summaries and the plain-text report built from them.
//!
//! The report is a view over the stored sessions; it can be regenerated
//! at any time from the store.

use std::fmt::Write;

use chrono::NaiveDateTime;

use super::entry::{parse_line, LINE_TIMESTAMP_FORMAT, STARTED_LINE};
use super::session_id::SessionId;
use super::store::LogStore;
use crate::error::CoreResult;

/// What one session's log contains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub session: SessionId,
    /// Physical lines, preamble and continuation lines included
    pub lines: usize,
    pub starts: usize,
    pub events: usize,
    pub infos: usize,
    pub errors: usize,
    pub first: Option<NaiveDateTime>,
    pub last: Option<NaiveDateTime>,
}

impl SessionSummary {
    /// Count the entries in a session's lines.
    ///
    /// Continuation lines (`, ...`) belong to the entry above them and are
    /// not counted again. Lines without a readable timestamp are skipped.
    pub fn from_lines(session: SessionId, lines: &[String]) -> Self {
        let mut summary = Self {
            session,
            lines: lines.len(),
            starts: 0,
            events: 0,
            infos: 0,
            errors: 0,
            first: None,
            last: None,
        };

        for (at, body) in lines.iter().filter_map(|line| parse_line(line)) {
            summary.first.get_or_insert(at);
            summary.last = Some(at);

            if body == STARTED_LINE {
                summary.starts += 1;
            } else if body.starts_with("Event: ") {
                summary.events += 1;
            } else if body.starts_with("FYI: ") {
                summary.infos += 1;
            } else if body.starts_with("Error: ") {
                summary.errors += 1;
            }
        }
        summary
    }
}

/// Summarize every session in `store`, oldest first.
pub async fn summarize(store: &dyn LogStore) -> CoreResult<Vec<SessionSummary>> {
    let mut summaries = Vec::new();
    for session in store.list_sessions().await? {
        let lines = store.read_contents(session).await?;
        summaries.push(SessionSummary::from_lines(session, &lines));
    }
    Ok(summaries)
}

/// Render summaries as a plain-text table.
pub fn render_report(summaries: &[SessionSummary]) -> String {
    if summaries.is_empty() {
        return "No sessions found.\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<16}  {:<20}  {:<20}  {:>5}  {:>6}  {:>6}  {:>6}  {:>6}",
        "SESSION", "FIRST", "LAST", "LINES", "STARTS", "EVENTS", "INFOS", "ERRORS"
    );
    for s in summaries {
        let _ = writeln!(
            out,
            "{:<16}  {:<20}  {:<20}  {:>5}  {:>6}  {:>6}  {:>6}  {:>6}",
            s.session,
            stamp(s.first),
            stamp(s.last),
            s.lines,
            s.starts,
            s.events,
            s.infos,
            s.errors
        );
    }

    let errors: usize = summaries.iter().map(|s| s.errors).sum();
    let _ = writeln!(out, "\n{} session(s), {} error(s)", summaries.len(), errors);
    out
}

fn stamp(at: Option<NaiveDateTime>) -> String {
    at.map(|at| at.format(LINE_TIMESTAMP_FORMAT).to_string())
        .unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::store::MemoryLogStore;

    fn sample_lines() -> Vec<String> {
        [
            "2018-03-24 13:39:50Z Created",
            "2018-03-24 13:39:50Z Started",
            "2018-03-24 13:39:51Z Event: Hello",
            "2018-03-24 13:39:51Z , AAA=BBB",
            "2018-03-24 13:40:02Z Error: ABC/Exception",
            "2018-03-24 13:40:02Z , Message = Exception FAILED",
            "2018-03-24 13:41:00Z FYI: done",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    #[test]
    fn test_summary_counts_entries() {
        let session = SessionId::from_ticks(1).unwrap();
        let summary = SessionSummary::from_lines(session, &sample_lines());

        assert_eq!(summary.lines, 7);
        assert_eq!(summary.starts, 1);
        assert_eq!(summary.events, 1);
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.infos, 1);
        assert_eq!(
            summary.first.unwrap().format(LINE_TIMESTAMP_FORMAT).to_string(),
            "2018-03-24 13:39:50Z"
        );
        assert_eq!(
            summary.last.unwrap().format(LINE_TIMESTAMP_FORMAT).to_string(),
            "2018-03-24 13:41:00Z"
        );
    }

    #[test]
    fn test_summary_skips_unreadable_lines() {
        let session = SessionId::from_ticks(1).unwrap();
        let lines = vec!["garbage".to_string()];
        let summary = SessionSummary::from_lines(session, &lines);

        assert_eq!(summary.lines, 1);
        assert_eq!(summary.first, None);
        assert_eq!(summary.events + summary.infos + summary.errors, 0);
    }

    #[tokio::test]
    async fn test_render_report() {
        let store = MemoryLogStore::new();
        let session = SessionId::from_ticks(0x08d5_918c_b754_5700).unwrap();
        let mut lines = sample_lines();
        store.create(session, lines.remove(0)).await.unwrap();
        store.append(session, lines).await.unwrap();

        let summaries = summarize(&store).await.unwrap();
        assert_eq!(summaries.len(), 1);

        let report = render_report(&summaries);
        assert!(report.contains("08d5918cb7545700"));
        assert!(report.contains("2018-03-24 13:41:00Z"));
        assert!(report.contains("1 session(s), 1 error(s)"));
    }

    #[test]
    fn test_render_empty_report() {
        assert_eq!(render_report(&[]), "No sessions found.\n");
    }
}
