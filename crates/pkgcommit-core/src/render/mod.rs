//! Commit progress frames.
//!
//! On a terminal each frame erases the variable block of the previous one
//! (active downloads, current install, summary line) and redraws it. History
//! lines ("Retrieved", "Installed") are printed above the block once and
//! scroll away with the rest of the terminal output.
//!
//! Without a terminal nothing is erased: new lines are appended as items
//! show up and frames with nothing new print a single dot.

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::io::Write;

use crate::ledger::{ItemProgress, ProgressLedger};
use crate::output::ansi::{cursor_up, CLEARLN};
use crate::output::Output;

/// Summary ETA when the ledger has no estimate.
const ETA_PLACEHOLDER: &str = "-:--";

#[derive(Debug, Default)]
pub struct TerminalRenderer {
    /// Variable lines written by the previous frame.
    last_line_count: usize,
    /// Lines the most recent frame erased.
    last_erase: usize,
    /// The previous frame ended with a summary line and no newline.
    summary_pending: bool,
    /// Output generation right after our last frame.
    last_generation: Option<u64>,
    /// Sequence numbers already written as history (or, in plain mode, first sightings).
    announced_downloads: BTreeSet<u32>,
    announced_install: u32,
    sighted_downloads: BTreeSet<u32>,
    sighted_install: u32,
}

impl TerminalRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything about previous frames. Called at commit start.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Number of lines the most recent frame erased before drawing.
    pub fn last_erase(&self) -> usize {
        self.last_erase
    }

    /// Number of variable lines the next frame will erase.
    pub fn line_count(&self) -> usize {
        self.last_line_count
    }

    /// Draw one frame of `ledger`. Console errors are logged, never returned.
    pub fn render(&mut self, ledger: &ProgressLedger, out: &mut Output) {
        if tracing::enabled!(tracing::Level::TRACE) {
            tracing::trace!("{}", ledger.dump());
        }
        // anything printed since our last frame starts a fresh block
        let continuing = self.last_generation == Some(out.generation());
        if !continuing {
            self.last_line_count = 0;
            self.summary_pending = false;
        }

        let mut frame = String::new();
        let open_line = if out.is_interactive() {
            self.terminal_frame(ledger, &mut frame, !out.at_line_start() && !continuing)
        } else {
            self.plain_frame(ledger, &mut frame, !out.at_line_start())
        };

        if let Err(e) = out.frame_writer().write_all(frame.as_bytes()) {
            tracing::debug!("commit progress write failed: {}", e);
        }
        out.frame_written(open_line);
        self.last_generation = Some(out.generation());
    }

    /// Close a pending summary or dot line at commit end.
    pub fn finish(&mut self, out: &mut Output) {
        let ours = self.last_generation == Some(out.generation());
        if ours && !out.at_line_start() {
            if let Err(e) = out.frame_writer().write_all(b"\n") {
                tracing::debug!("commit progress write failed: {}", e);
            }
            out.frame_written(false);
        }
        self.last_line_count = 0;
        self.summary_pending = false;
        self.last_generation = Some(out.generation());
    }

    fn terminal_frame(&mut self, ledger: &ProgressLedger, frame: &mut String, newline_first: bool) -> bool {
        if newline_first {
            frame.push('\n');
        }
        self.last_erase = self.last_line_count;
        if self.last_line_count > 0 {
            frame.push_str(&cursor_up(self.last_line_count));
            frame.push_str(CLEARLN);
        } else if self.summary_pending {
            frame.push_str(CLEARLN);
        }

        self.history_lines(ledger, frame);

        let mut lines = 0;
        for (key, item) in ledger.active() {
            let _ = writeln!(frame, "{}", active_line(key, item));
            lines += 1;
        }
        if let Some(line) = install_line(ledger.current_install()) {
            let _ = writeln!(frame, "{}", line);
            lines += 1;
        }
        self.last_line_count = lines;

        self.summary_pending = match summary_line(ledger) {
            Some(summary) => {
                frame.push_str(&summary);
                true
            }
            None => false,
        };
        self.summary_pending
    }

    fn plain_frame(&mut self, ledger: &ProgressLedger, frame: &mut String, line_open: bool) -> bool {
        self.last_erase = 0;
        self.last_line_count = 0;

        let mut news = String::new();
        self.history_lines(ledger, &mut news);
        for (key, item) in ledger.active() {
            if self.sighted_downloads.insert(item.sequence_number) {
                let _ = writeln!(news, "Retrieving {}", key);
            }
        }
        let install = ledger.current_install();
        if !install.is_empty() && install.sequence_number != self.sighted_install {
            self.sighted_install = install.sequence_number;
            if let Some(line) = install_line(install) {
                let _ = writeln!(news, "{}", line);
            }
        }

        if news.is_empty() {
            frame.push('.');
            return true;
        }
        if line_open {
            frame.push('\n');
        }
        frame.push_str(&news);
        false
    }

    /// "Retrieved" and "Installed" lines not printed before.
    fn history_lines(&mut self, ledger: &ProgressLedger, frame: &mut String) {
        for (key, item) in ledger.recently_finished() {
            if !self.announced_downloads.insert(item.sequence_number) {
                continue;
            }
            if item.speed_average.is_zero() {
                let _ = writeln!(frame, "Retrieved {}", key);
            } else {
                let _ = writeln!(frame, "Retrieved {} [{}/s]", key, item.speed_average);
            }
        }

        let done = ledger.last_finished_install();
        if !done.is_empty() && done.sequence_number != self.announced_install {
            self.announced_install = done.sequence_number;
            let name = done
                .package
                .as_ref()
                .map(|p| p.to_string())
                .unwrap_or_default();
            let _ = writeln!(frame, "Installed {}", name);
            if !done.info_message.is_empty() {
                let _ = writeln!(frame, "{}", done.info_message);
            }
        }
    }
}

fn active_line(key: &str, item: &ItemProgress) -> String {
    if item.retrieving_delta() {
        format!(
            "Retrieving {} [{}% ({}/s)]",
            item.delta_filename, item.delta_download_pct, item.speed_current
        )
    } else if item.applying_delta() {
        format!("Applying {} [{}%]", item.delta_filename, item.delta_apply_pct)
    } else {
        format!(
            "Retrieving {} [{}% ({}/s)]",
            key,
            item.percentage.max(0),
            item.speed_current
        )
    }
}

fn install_line(install: &ItemProgress) -> Option<String> {
    if install.is_empty() {
        return None;
    }
    let name = install
        .package
        .as_ref()
        .map(|p| p.to_string())
        .unwrap_or_default();
    Some(format!("Installing: {}", name))
}

/// `"<label> <pct>% ETA <eta>"`, or nothing when no item is in flight.
pub fn summary_line(ledger: &ProgressLedger) -> Option<String> {
    let overall = ledger.compute_overall();
    let label = overall.label?;
    let eta = if overall.eta_seconds < 0 {
        ETA_PLACEHOLDER.to_string()
    } else {
        ledger.eta_as_text()
    };
    Some(format!("{} {}% ETA {}", label, overall.percentage.max(0), eta))
}

#[cfg(test)]
mod tests;
