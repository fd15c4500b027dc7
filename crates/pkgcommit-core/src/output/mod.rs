//! Console output sink: messages, errors, labelled progress and prompts.
//!
//! `Output` owns stdout and stderr. The commit renderer draws frames through
//! it too, so it knows whether the cursor sits mid-line and whether anything
//! else was printed since the last frame.

pub mod ansi;
mod cursor;

pub use cursor::AliveCursor;

use serde::{Deserialize, Serialize};
use std::io::{self, IsTerminal, Write};
use url::Url;

use crate::bytes::ByteCount;
use crate::ledger::key_for_url;
use crate::retry::PromptOptions;

use self::ansi::CLEARLN;

/// Console verbosity, ordered from least to most talkative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    High,
    Debug,
}

impl Verbosity {
    /// Apply `-v` / `-q` counts on top of a configured level.
    pub fn adjusted(self, verbose: u8, quiet: bool) -> Self {
        if quiet {
            return Verbosity::Quiet;
        }
        match (self as u8).saturating_add(verbose) {
            0 => Verbosity::Quiet,
            1 => Verbosity::Normal,
            2 => Verbosity::High,
            _ => Verbosity::Debug,
        }
    }
}

pub type Sink = Box<dyn Write + Send>;

pub struct Output {
    verbosity: Verbosity,
    interactive: bool,
    stdout: Sink,
    stderr: Sink,
    /// False while a progress line is left open without a trailing newline.
    at_line_start: bool,
    /// Bumped on every write that is not a commit frame.
    generation: u64,
    cursor: AliveCursor,
}

impl Output {
    pub fn new(verbosity: Verbosity, interactive: bool, stdout: Sink, stderr: Sink) -> Self {
        Self {
            verbosity,
            interactive,
            stdout,
            stderr,
            at_line_start: true,
            generation: 0,
            cursor: AliveCursor::default(),
        }
    }

    /// Process stdout/stderr; in-place redraws only when stdout is a terminal.
    pub fn stdio(verbosity: Verbosity) -> Self {
        let interactive = io::stdout().is_terminal();
        Self::new(
            verbosity,
            interactive,
            Box::new(io::stdout()),
            Box::new(io::stderr()),
        )
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    pub fn set_verbosity(&mut self, verbosity: Verbosity) {
        self.verbosity = verbosity;
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    pub fn at_line_start(&self) -> bool {
        self.at_line_start
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    // low-level writes; console errors are logged and otherwise ignored

    fn out(&mut self, text: &str) {
        if let Err(e) = self.stdout.write_all(text.as_bytes()) {
            tracing::debug!("stdout write failed: {}", e);
        }
    }

    fn err(&mut self, text: &str) {
        if let Err(e) = self.stderr.write_all(text.as_bytes()) {
            tracing::debug!("stderr write failed: {}", e);
        }
    }

    fn flush(&mut self) {
        let _ = self.stdout.flush();
        let _ = self.stderr.flush();
    }

    fn finish_open_line(&mut self) {
        if !self.at_line_start {
            self.out("\n");
            self.at_line_start = true;
        }
    }

    fn touched(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    /// Raw access for the commit renderer. The frame does not count as a foreign write.
    pub(crate) fn frame_writer(&mut self) -> &mut dyn Write {
        &mut self.stdout
    }

    /// Called by the renderer after a frame; `open_line` means no trailing newline was written.
    pub(crate) fn frame_written(&mut self, open_line: bool) {
        self.at_line_start = !open_line;
        let _ = self.stdout.flush();
    }

    fn filtered(&self, verbosity: Verbosity) -> bool {
        self.verbosity < verbosity
    }

    /// Informational line, shown when the configured verbosity is at least `verbosity`.
    pub fn info(&mut self, msg: &str, verbosity: Verbosity) {
        if self.filtered(verbosity) {
            return;
        }
        self.finish_open_line();
        self.out(msg);
        self.out("\n");
        self.touched();
        self.flush();
    }

    pub fn warning(&mut self, msg: &str, verbosity: Verbosity) {
        if self.filtered(verbosity) {
            return;
        }
        self.finish_open_line();
        self.out("Warning: ");
        self.out(msg);
        self.out("\n");
        self.touched();
        self.flush();
    }

    /// Problem description on stderr; `hint` follows unless running quiet.
    pub fn error(&mut self, problem: &str, hint: Option<&str>) {
        self.finish_open_line();
        self.err(problem);
        if let Some(hint) = hint.filter(|h| !h.is_empty()) {
            if self.verbosity > Verbosity::Quiet {
                self.err("\n");
                self.err(hint);
            }
        }
        self.err("\n");
        self.touched();
        self.flush();
    }

    // generic labelled progress

    fn progress_filtered(&self) -> bool {
        self.verbosity < Verbosity::Normal
    }

    fn display_progress(&mut self, label: &str, percent: Option<i32>) {
        if self.interactive {
            let mark = match percent {
                Some(p) if (0..=100).contains(&p) => format!("{}%", p),
                _ => self.cursor.tick().to_string(),
            };
            self.out(&format!("{}{} [{}]", CLEARLN, label, mark));
        } else {
            self.out(".");
        }
        let _ = self.stdout.flush();
    }

    pub fn progress_start(&mut self, id: &str, label: &str, is_tick: bool) {
        if self.progress_filtered() {
            return;
        }
        tracing::trace!(id, label, "progress start");
        self.finish_open_line();
        if !self.interactive {
            self.out(&format!("{} [", label));
        }
        self.display_progress(label, if is_tick { None } else { Some(0) });
        self.at_line_start = false;
        self.touched();
    }

    /// `value` of `None` means indeterminate (spinner tick).
    pub fn progress(&mut self, id: &str, label: &str, value: Option<i32>) {
        if self.progress_filtered() {
            return;
        }
        tracing::trace!(id, label, ?value, "progress");
        self.display_progress(label, value);
        self.at_line_start = false;
        self.touched();
    }

    pub fn progress_end(&mut self, id: &str, label: &str, error: bool) {
        if self.progress_filtered() {
            return;
        }
        tracing::trace!(id, label, error, "progress end");
        if self.interactive {
            self.out(&format!("{}{} [", CLEARLN, label));
        }
        self.out(if error { "error" } else { "done" });
        self.out("]\n");
        self.at_line_start = true;
        self.touched();
        self.flush();
    }

    // single-file download progress (outside a commit)

    fn download_label(&self, url: &Url) -> String {
        if self.verbosity == Verbosity::Debug {
            url.to_string()
        } else {
            key_for_url(url)
        }
    }

    pub fn download_progress_start(&mut self, url: &Url) {
        if self.filtered(Verbosity::Normal) {
            return;
        }
        let name = self.download_label(url);
        self.finish_open_line();
        if self.interactive {
            self.out(&format!("{}Retrieving: {} [starting]", CLEARLN, name));
        } else {
            self.out(&format!("Retrieving: {} [", name));
        }
        self.at_line_start = false;
        self.touched();
        let _ = self.stdout.flush();
    }

    /// `percent` outside 0..=100 and `rate` of `None` are left out of the brackets.
    pub fn download_progress(&mut self, url: &Url, percent: i32, rate: Option<ByteCount>) {
        if self.filtered(Verbosity::Normal) {
            return;
        }
        if !self.interactive {
            self.out(".");
            let _ = self.stdout.flush();
            self.at_line_start = false;
            return;
        }
        let name = self.download_label(url);
        let mut line = format!("{}Retrieving: {}", CLEARLN, name);
        let valid_pct = (0..=100).contains(&percent);
        if valid_pct || rate.is_some() {
            line.push_str(" [");
            if valid_pct {
                line.push_str(&format!("{}%", percent));
            }
            if let Some(rate) = rate {
                line.push_str(&format!(" ({}/s)", rate));
            }
            line.push(']');
        }
        self.out(&line);
        self.at_line_start = false;
        self.touched();
        let _ = self.stdout.flush();
    }

    pub fn download_progress_end(&mut self, url: &Url, rate: Option<ByteCount>, error: bool) {
        if self.filtered(Verbosity::Normal) {
            return;
        }
        let status = if error { "error" } else { "done" };
        if self.interactive {
            let name = self.download_label(url);
            self.out(&format!("{}Retrieving: {} [{}", CLEARLN, name, status));
        } else {
            self.out(status);
        }
        if let Some(rate) = rate {
            self.out(&format!(" ({}/s)", rate));
        }
        self.out("]\n");
        self.at_line_start = true;
        self.touched();
        self.flush();
    }

    /// Print a prompt; the reply is read elsewhere. `start_desc` goes on its own line first.
    pub fn prompt(&mut self, text: &str, options: &PromptOptions, start_desc: Option<&str>) {
        self.finish_open_line();
        match start_desc.filter(|d| !d.is_empty()) {
            Some(desc) => {
                self.out(desc);
                self.out("\n");
            }
            None if self.interactive => self.out(CLEARLN),
            None => {}
        }
        self.out(text);
        if !options.is_empty() {
            self.out(" ");
            self.out(&options.option_string());
        }
        self.out(": ");
        // the user's <enter> ends the line
        self.at_line_start = true;
        self.touched();
        self.flush();
    }

    pub fn prompt_help(&mut self, options: &PromptOptions) {
        self.out("\n");
        if options.help_is_empty() {
            self.out("No help available for this prompt.\n");
        } else {
            let lines: Vec<String> = options
                .options()
                .iter()
                .enumerate()
                .map(|(i, opt)| match options.option_help(i) {
                    Some(help) => format!("{} - {}\n", opt, help),
                    None => format!("{} - (no help available for this option)\n", opt),
                })
                .collect();
            for line in lines {
                self.out(&line);
            }
        }
        self.out(&format!("\n{}: ", options.option_string()));
        self.at_line_start = true;
        self.touched();
        self.flush();
    }

    /// Echo a reply chosen without user input (timeout, non-interactive) so the transcript reads naturally.
    pub(crate) fn echo_reply(&mut self, reply: &str) {
        self.out(reply);
        self.out("\n");
        self.at_line_start = true;
        self.touched();
        self.flush();
    }
}
