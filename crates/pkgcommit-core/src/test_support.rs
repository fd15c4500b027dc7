//! Shared helpers for unit tests: capturable console output.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use crate::config::PkgcommitConfig;
use crate::control::ExitFlag;
use crate::output::{Output, Verbosity};
use crate::retry::{Prompter, ScriptedReplies};
use crate::session::CommitSession;

/// In-memory writer whose clones share one buffer.
#[derive(Debug, Clone, Default)]
pub(crate) struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    pub(crate) fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    /// Return and forget everything written so far.
    pub(crate) fn take(&self) -> String {
        let mut guard = self.0.lock().unwrap();
        let text = String::from_utf8_lossy(&guard).into_owned();
        guard.clear();
        text
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Output writing into two buffers (stdout, stderr).
pub(crate) fn captured_output(verbosity: Verbosity, interactive: bool) -> (Output, SharedBuf, SharedBuf) {
    let out = SharedBuf::default();
    let err = SharedBuf::default();
    let output = Output::new(
        verbosity,
        interactive,
        Box::new(out.clone()),
        Box::new(err.clone()),
    );
    (output, out, err)
}

/// Session with captured output, scripted replies and no render throttling.
pub(crate) fn test_session(
    verbosity: Verbosity,
    interactive: bool,
    replies: &[&str],
) -> (CommitSession, SharedBuf, SharedBuf) {
    throttled_session(0, verbosity, interactive, replies)
}

/// Like [`test_session`], with progress-update renders at most every `render_interval_ms`.
pub(crate) fn throttled_session(
    render_interval_ms: u64,
    verbosity: Verbosity,
    interactive: bool,
    replies: &[&str],
) -> (CommitSession, SharedBuf, SharedBuf) {
    let (out, stdout, stderr) = captured_output(verbosity, interactive);
    let prompter = Prompter::scripted(ScriptedReplies::new(replies.iter().copied()));
    let cfg = PkgcommitConfig {
        render_interval_ms,
        ..PkgcommitConfig::default()
    };
    let session = CommitSession::new(cfg, out, prompter, ExitFlag::new());
    (session, stdout, stderr)
}
