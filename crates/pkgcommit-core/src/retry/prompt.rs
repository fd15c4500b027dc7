//! Prompt plumbing: option sets, reply sources and the blocking read helpers.
//!
//! Every wait checks the exit flag, so Ctrl-C resolves a pending prompt to
//! its abort-equivalent instead of leaving the engine blocked.

use std::collections::VecDeque;
use std::io::{self, BufRead};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use crate::control::ExitFlag;
use crate::output::Output;

use super::Action;

/// Granularity of stdin waits; bounds how late an exit request is noticed.
const WAIT_SLICE: Duration = Duration::from_millis(100);

/// Replies accepted by a prompt, e.g. `a/r/i/u/s` with default `a`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptOptions {
    options: Vec<String>,
    help: Vec<Option<String>>,
    default: usize,
    /// Options past this index are accepted but shown as `...`.
    shown_count: Option<usize>,
}

impl PromptOptions {
    /// `choices` is a `/`-separated list of replies; `default` indexes into it.
    pub fn new(choices: &str, default: usize) -> Self {
        let options: Vec<String> = choices
            .split('/')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect();
        let help = vec![None; options.len()];
        let default = if default < options.len() { default } else { 0 };
        Self {
            options,
            help,
            default,
            shown_count: None,
        }
    }

    /// An option set with no fixed replies (free text prompts).
    pub fn free_text() -> Self {
        Self::new("", 0)
    }

    pub fn set_option_help(&mut self, index: usize, help: &str) {
        if let Some(slot) = self.help.get_mut(index) {
            *slot = Some(help.to_string());
        } else {
            tracing::warn!(index, "help for non-existent prompt option");
        }
    }

    pub fn set_shown_count(&mut self, count: usize) {
        self.shown_count = Some(count);
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn option_help(&self, index: usize) -> Option<&str> {
        self.help.get(index).and_then(|h| h.as_deref())
    }

    pub fn help_is_empty(&self) -> bool {
        self.help.iter().all(Option::is_none)
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub fn default_index(&self) -> usize {
        self.default
    }

    pub fn default_option(&self) -> &str {
        self.options.get(self.default).map(String::as_str).unwrap_or("")
    }

    /// `[a/r/i/.../?] (a)`: shown options, `...` for hidden ones, `?` when help exists.
    pub fn option_string(&self) -> String {
        let shown = self
            .shown_count
            .map_or(self.options.len(), |n| n.min(self.options.len()));
        let mut parts: Vec<&str> = self.options[..shown].iter().map(String::as_str).collect();
        if shown < self.options.len() {
            parts.push("...");
        }
        if !self.help_is_empty() {
            parts.push("?");
        }
        format!("[{}] ({})", parts.join("/"), self.default_option())
    }

    /// Index of the option matching `reply`, case-insensitively. Hidden options match too.
    pub fn match_reply(&self, reply: &str) -> Option<usize> {
        let reply = reply.trim();
        self.options
            .iter()
            .position(|o| o.eq_ignore_ascii_case(reply))
    }
}

/// One attempt at reading a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyInput {
    Line(String),
    /// The wait bound elapsed with no reply.
    TimedOut,
    /// Input is exhausted (EOF).
    Closed,
    /// An exit was requested while waiting.
    Interrupted,
}

/// Where prompt replies come from.
pub trait ReplySource: Send {
    /// Wait for the next line, at most `wait` when given. Must return
    /// `Interrupted` promptly once `exit` is requested.
    fn next_reply(&mut self, wait: Option<Duration>, exit: &ExitFlag) -> ReplyInput;
}

/// Lines from the process stdin, read by a background thread so waits can
/// be bounded and interrupted.
#[derive(Default)]
pub struct StdinReplies {
    lines: Option<Receiver<String>>,
}

impl StdinReplies {
    pub fn new() -> Self {
        Self::default()
    }

    fn receiver(&mut self) -> &Receiver<String> {
        self.lines.get_or_insert_with(|| {
            let (tx, rx) = mpsc::channel();
            thread::spawn(move || {
                let stdin = io::stdin();
                for line in stdin.lock().lines() {
                    match line {
                        Ok(line) => {
                            if tx.send(line).is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            tracing::debug!("stdin read failed: {}", e);
                            break;
                        }
                    }
                }
            });
            rx
        })
    }
}

impl ReplySource for StdinReplies {
    fn next_reply(&mut self, wait: Option<Duration>, exit: &ExitFlag) -> ReplyInput {
        let deadline = wait.map(|w| Instant::now() + w);
        let rx = self.receiver();
        loop {
            if exit.is_requested() {
                return ReplyInput::Interrupted;
            }
            let slice = match deadline {
                Some(deadline) => {
                    let left = deadline.saturating_duration_since(Instant::now());
                    if left.is_zero() {
                        return ReplyInput::TimedOut;
                    }
                    left.min(WAIT_SLICE)
                }
                None => WAIT_SLICE,
            };
            match rx.recv_timeout(slice) {
                Ok(line) => return ReplyInput::Line(line),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return ReplyInput::Closed,
            }
        }
    }
}

/// Pre-recorded replies, consumed in order. `None` entries simulate a timeout.
#[derive(Debug, Clone, Default)]
pub struct ScriptedReplies {
    queue: VecDeque<Option<String>>,
}

impl ScriptedReplies {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            queue: replies.into_iter().map(|r| Some(r.into())).collect(),
        }
    }

    pub fn push(&mut self, reply: impl Into<String>) {
        self.queue.push_back(Some(reply.into()));
    }

    pub fn push_timeout(&mut self) {
        self.queue.push_back(None);
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl ReplySource for ScriptedReplies {
    fn next_reply(&mut self, _wait: Option<Duration>, exit: &ExitFlag) -> ReplyInput {
        if exit.is_requested() {
            return ReplyInput::Interrupted;
        }
        match self.queue.pop_front() {
            Some(Some(line)) => ReplyInput::Line(line),
            Some(None) => ReplyInput::TimedOut,
            None => ReplyInput::Closed,
        }
    }
}

/// Asks questions on `Output` and reads the answers from a `ReplySource`.
pub struct Prompter {
    replies: Box<dyn ReplySource>,
    non_interactive: bool,
}

impl Prompter {
    pub fn new(replies: Box<dyn ReplySource>, non_interactive: bool) -> Self {
        Self {
            replies,
            non_interactive,
        }
    }

    pub fn stdin(non_interactive: bool) -> Self {
        Self::new(Box::new(StdinReplies::new()), non_interactive)
    }

    pub fn scripted(replies: ScriptedReplies) -> Self {
        Self::new(Box::new(replies), false)
    }

    pub fn is_non_interactive(&self) -> bool {
        self.non_interactive
    }

    /// Show `text` with `options` and return the chosen index.
    ///
    /// Empty reply, timeout and closed input pick the default. `None` means
    /// an exit was requested.
    pub fn ask(
        &mut self,
        out: &mut Output,
        exit: &ExitFlag,
        text: &str,
        options: &PromptOptions,
        timeout: Option<Duration>,
    ) -> Option<usize> {
        if exit.is_requested() {
            tracing::debug!("exit requested, not prompting: {}", text);
            return None;
        }
        out.prompt(text, options, None);
        if self.non_interactive {
            tracing::info!("non-interactive mode, choosing '{}'", options.default_option());
            out.echo_reply(options.default_option());
            return Some(options.default_index());
        }

        let deadline = timeout.map(|t| Instant::now() + t);
        loop {
            let wait = deadline.map(|d| d.saturating_duration_since(Instant::now()));
            match self.replies.next_reply(wait, exit) {
                ReplyInput::Line(line) => {
                    let reply = line.trim();
                    if reply.is_empty() {
                        return Some(options.default_index());
                    }
                    if reply == "?" {
                        out.prompt_help(options);
                        continue;
                    }
                    if let Some(index) = options.match_reply(reply) {
                        return Some(index);
                    }
                    tracing::warn!(reply, "invalid prompt reply");
                    let hint = (!options.help_is_empty()).then_some("Enter '?' for help.");
                    out.error(&format!("Invalid answer '{}'.", reply), hint);
                    out.prompt(text, options, None);
                }
                ReplyInput::TimedOut => {
                    tracing::info!("prompt timed out, choosing '{}'", options.default_option());
                    out.echo_reply(options.default_option());
                    return Some(options.default_index());
                }
                ReplyInput::Closed => {
                    tracing::warn!("no more input, choosing '{}'", options.default_option());
                    out.echo_reply(options.default_option());
                    return Some(options.default_index());
                }
                ReplyInput::Interrupted => {
                    out.echo_reply("");
                    return None;
                }
            }
        }
    }

    fn ari_options(default: Action) -> PromptOptions {
        let mut options = PromptOptions::new("a/r/i", default.ari_index());
        options.set_option_help(0, "Abort the operation.");
        options.set_option_help(1, "Try again.");
        options.set_option_help(2, "Skip this step and continue.");
        options
    }

    /// Abort/Retry/Ignore, resolving to Abort on exit.
    pub fn read_action_ari(&mut self, out: &mut Output, exit: &ExitFlag, default: Action) -> Action {
        let options = Self::ari_options(default);
        self.ask(out, exit, "Abort, retry, ignore?", &options, None)
            .and_then(Action::from_ari_index)
            .unwrap_or(Action::Abort)
    }

    /// Abort/Retry/Ignore that picks `default` after `timeout` without an answer.
    pub fn read_action_ari_with_timeout(
        &mut self,
        out: &mut Output,
        exit: &ExitFlag,
        timeout: Duration,
        default: Action,
    ) -> Action {
        let options = Self::ari_options(default);
        if !self.non_interactive {
            out.info(
                &format!(
                    "Autoselecting '{}' after {} seconds.",
                    options.default_option(),
                    timeout.as_secs()
                ),
                crate::output::Verbosity::Normal,
            );
        }
        self.ask(out, exit, "Abort, retry, ignore?", &options, Some(timeout))
            .and_then(Action::from_ari_index)
            .unwrap_or(Action::Abort)
    }

    /// Yes/no question; `false` on exit.
    pub fn read_bool_answer(
        &mut self,
        out: &mut Output,
        exit: &ExitFlag,
        question: &str,
        default: bool,
    ) -> bool {
        let options = PromptOptions::new("y/n", if default { 0 } else { 1 });
        self.ask(out, exit, question, &options, None) == Some(0)
    }

    /// Free-text answer; empty reply, closed input and exit all yield `default`.
    pub fn get_text(&mut self, out: &mut Output, exit: &ExitFlag, label: &str, default: &str) -> String {
        let text = if default.is_empty() {
            label.to_string()
        } else {
            format!("{} [{}]", label, default)
        };
        if exit.is_requested() {
            return default.to_string();
        }
        out.prompt(&text, &PromptOptions::free_text(), None);
        if self.non_interactive {
            out.echo_reply(default);
            return default.to_string();
        }
        match self.replies.next_reply(None, exit) {
            ReplyInput::Line(line) if !line.trim().is_empty() => line.trim().to_string(),
            _ => default.to_string(),
        }
    }

    /// Block until the user presses ENTER (or input ends, or exit is requested).
    pub fn wait_for_enter(&mut self, exit: &ExitFlag) {
        if self.non_interactive {
            return;
        }
        let _ = self.replies.next_reply(None, exit);
    }
}
