//! Recorded engine runs: one JSON object per line.
//!
//! Besides engine events a log carries the commit boundaries:
//!
//! ```text
//! # comment
//! {"event":"commit_begin","items_to_fetch":2,"bytes_to_fetch":4096,"items_to_install":2}
//! {"event":"resolvable_download_start","package":{...},"url":"https://..."}
//! {"event":"commit_end"}
//! ```

use std::fs;
use std::path::Path;

use crate::callbacks::{EngineEvent, EventBus, Reply};
use crate::ledger::CommitTotals;
use crate::session::CommitSession;

const COMMIT_BEGIN: &str = "commit_begin";
const COMMIT_END: &str = "commit_end";

#[derive(Debug, Clone, PartialEq)]
pub enum LogRecord {
    CommitBegin(CommitTotals),
    CommitEnd,
    Event(EngineEvent),
}

#[derive(Debug, thiserror::Error)]
pub enum EventLogError {
    #[error("failed to read event log {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("line {line}: invalid JSON: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("line {line}: record has no \"event\" tag")]
    MissingTag { line: usize },
    #[error("line {line}: bad {tag} record: {source}")]
    Record {
        line: usize,
        tag: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Parse a whole log. Blank lines and lines starting with `#` are skipped.
pub fn parse_event_log(text: &str) -> Result<Vec<LogRecord>, EventLogError> {
    let mut records = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        records.push(parse_line(idx + 1, line)?);
    }
    Ok(records)
}

pub fn read_event_log(path: &Path) -> Result<Vec<LogRecord>, EventLogError> {
    let text = fs::read_to_string(path).map_err(|source| EventLogError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_event_log(&text)
}

fn parse_line(line: usize, text: &str) -> Result<LogRecord, EventLogError> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|source| EventLogError::Json { line, source })?;
    let tag = value
        .get("event")
        .and_then(|t| t.as_str())
        .ok_or(EventLogError::MissingTag { line })?
        .to_string();
    let record_err = |source| EventLogError::Record {
        line,
        tag: tag.clone(),
        source,
    };
    match tag.as_str() {
        COMMIT_BEGIN => serde_json::from_value(value)
            .map(LogRecord::CommitBegin)
            .map_err(record_err),
        COMMIT_END => Ok(LogRecord::CommitEnd),
        _ => serde_json::from_value(value)
            .map(LogRecord::Event)
            .map_err(record_err),
    }
}

/// How a replay ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReplayOutcome {
    /// Engine events delivered to the bus.
    pub delivered: usize,
    /// A handler asked the engine to stop.
    pub aborted: bool,
}

/// Feed `records` through `bus` as the engine would.
///
/// `pace` runs before each record (the CLI sleeps there). The replay stops
/// at the first abort reply or exit request and closes a running commit.
pub fn replay(
    records: Vec<LogRecord>,
    session: &mut CommitSession,
    bus: &mut EventBus,
    mut pace: impl FnMut(&LogRecord),
) -> ReplayOutcome {
    let mut outcome = ReplayOutcome::default();
    for record in records {
        pace(&record);
        if session.exit_requested() {
            tracing::info!("exit requested, stopping replay");
            outcome.aborted = true;
            break;
        }
        match record {
            LogRecord::CommitBegin(totals) => session.begin_commit(totals),
            LogRecord::CommitEnd => session.end_commit(),
            LogRecord::Event(mut event) => {
                let reply = bus.emit(session, &mut event);
                outcome.delivered += 1;
                tracing::debug!(event = event.name(), ?reply, "replied");
                if reply.is_abort() {
                    tracing::info!(event = event.name(), "handler aborted the operation");
                    outcome.aborted = true;
                    break;
                }
                if let Reply::Action(action) = reply {
                    tracing::info!(event = event.name(), ?action, "problem resolved");
                }
            }
        }
    }
    session.end_commit();
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callbacks::StandardCallbacks;
    use crate::output::Verbosity;
    use crate::test_support::test_session;

    const LOG: &str = r#"
# two packages, one install
{"event":"commit_begin","items_to_fetch":1,"bytes_to_fetch":2048,"items_to_install":1}
{"event":"resolvable_download_start","package":{"name":"a","edition":"1.0","arch":"noarch","location":"noarch/a-1.0.noarch.rpm"},"url":"http://x.org/noarch/a-1.0.noarch.rpm"}
{"event":"download_progress","url":"http://x.org/noarch/a-1.0.noarch.rpm","percent":50,"rate_now":512}

{"event":"resolvable_download_finish","package":{"name":"a","edition":"1.0","arch":"noarch","location":"noarch/a-1.0.noarch.rpm"}}
{"event":"install_start","package":{"name":"a","edition":"1.0"}}
{"event":"install_finish"}
{"event":"commit_end"}
"#;

    #[test]
    fn parses_records_and_skips_comments() {
        let records = parse_event_log(LOG).unwrap();
        assert_eq!(records.len(), 7);
        assert_eq!(
            records[0],
            LogRecord::CommitBegin(CommitTotals::new(1, 2048, 1))
        );
        assert_eq!(records[6], LogRecord::CommitEnd);
        assert!(matches!(
            &records[1],
            LogRecord::Event(EngineEvent::ResolvableDownloadStart { package, .. })
                if package.kind == "package" && package.key() == "a-1.0.noarch.rpm"
        ));
    }

    #[test]
    fn errors_carry_line_numbers() {
        let err = parse_event_log("\n{not json}\n").unwrap_err();
        assert!(matches!(err, EventLogError::Json { line: 2, .. }));

        let err = parse_event_log(r#"{"percent":3}"#).unwrap_err();
        assert!(matches!(err, EventLogError::MissingTag { line: 1 }));

        let err = parse_event_log("# c\n{\"event\":\"install_progress\"}").unwrap_err();
        assert!(matches!(err, EventLogError::Record { line: 2, .. }));
        assert!(err.to_string().starts_with("line 2: bad install_progress record"));

        let err = parse_event_log(r#"{"event":"teleport"}"#).unwrap_err();
        assert!(matches!(err, EventLogError::Record { line: 1, .. }));
    }

    #[test]
    fn read_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_event_log(&dir.path().join("missing.jsonl")).unwrap_err();
        assert!(matches!(err, EventLogError::Io { .. }));
    }

    #[test]
    fn replay_drives_a_commit() {
        let (mut s, stdout, _) = test_session(Verbosity::Normal, false, &[]);
        let mut bus = EventBus::new();
        let set = StandardCallbacks::connect(&mut bus);
        let mut paced = 0;
        let outcome = replay(parse_event_log(LOG).unwrap(), &mut s, &mut bus, |_| paced += 1);
        set.disconnect(&mut bus);

        assert_eq!(paced, 7);
        assert_eq!(outcome.delivered, 5);
        assert!(!outcome.aborted);
        assert!(!s.is_commit_running());
        assert_eq!(
            stdout.contents(),
            "Retrieving a-1.0.noarch.rpm\n\
             .\n\
             Retrieved a-1.0.noarch.rpm\n\
             Installing: a-1.0\n\
             Installed a-1.0\n"
        );
    }

    #[test]
    fn replay_stops_on_abort() {
        let log = r#"
{"event":"commit_begin","items_to_fetch":0,"items_to_install":1}
{"event":"install_start","package":{"name":"a","edition":"1"}}
{"event":"install_problem","description":"scriptlet failed"}
{"event":"install_finish"}
"#;
        let (mut s, _, _) = test_session(Verbosity::Normal, false, &["a"]);
        let mut bus = EventBus::new();
        let _set = StandardCallbacks::connect(&mut bus);
        let outcome = replay(parse_event_log(log).unwrap(), &mut s, &mut bus, |_| {});
        assert!(outcome.aborted);
        assert_eq!(outcome.delivered, 2);
        assert!(!s.is_commit_running());
    }
}
