//! Medium problem dialogs.
//!
//! Soft I/O errors get a timed prompt whose default flips to Abort once the
//! same URL keeps failing; everything else gets a scheme-specific
//! Abort/Retry/Ignore set with extras.

use std::time::Duration;

use anyhow::Result;
use url::Url;

use crate::config::MediumConfig;
use crate::control::ExitFlag;
use crate::output::{Output, Verbosity};

use super::counter::RepeatCounter;
use super::prompt::{PromptOptions, Prompter};
use super::{is_changeable_media, Action, MediumError};

pub const VERIFY_HINT: &str = "You may run 'pkgcommit verify' to repair any dependency problems.";

const ARI_TEXT: &str = "Abort, retry, ignore?";

/// A medium-level failure as reported by the engine. `url` may be rewritten
/// by the dialog (change URI, disable SSL check).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediumProblem {
    pub url: Url,
    pub medium_nr: u32,
    pub label: String,
    pub error: MediumError,
    pub description: String,
    pub devices: Vec<String>,
}

/// Device operations the dialogs may call back into.
pub trait MediumControl {
    fn eject(&mut self, url: &Url, device: &str) -> Result<()>;
}

/// Logs eject requests and does nothing else.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMedium;

impl MediumControl for NoopMedium {
    fn eject(&mut self, url: &Url, device: &str) -> Result<()> {
        tracing::info!(%url, device, "eject requested");
        Ok(())
    }
}

/// Everything a medium dialog touches besides the decider's own state.
pub struct MediumContext<'a> {
    pub out: &'a mut Output,
    pub prompter: &'a mut Prompter,
    pub exit: &'a ExitFlag,
    pub control: &'a mut dyn MediumControl,
    /// An RPM download is what failed.
    pub rpm_download_active: bool,
    /// Session-wide: the verify hint was already printed.
    pub seen_verify_hint: &'a mut bool,
}

#[derive(Debug, Clone)]
pub struct MediumDecider {
    counter: RepeatCounter,
    prompt_timeout: Duration,
}

impl Default for MediumDecider {
    fn default() -> Self {
        Self::new(&MediumConfig::default())
    }
}

impl MediumDecider {
    pub fn new(cfg: &MediumConfig) -> Self {
        Self {
            counter: RepeatCounter::new(cfg.repeat_limit),
            prompt_timeout: cfg.prompt_timeout(),
        }
    }

    pub fn counter(&self) -> &RepeatCounter {
        &self.counter
    }

    /// Decide what to do about `problem`. Always resolves, even with nobody at the terminal.
    pub fn request_medium(&mut self, problem: &mut MediumProblem, ctx: &mut MediumContext<'_>) -> Action {
        tracing::debug!(
            url = %problem.url,
            error = ?problem.error,
            label = %problem.label,
            medium = problem.medium_nr,
            "medium problem"
        );
        ctx.out.error(&problem.description, None);

        if is_changeable_media(&problem.url) && problem.error.wants_medium_change() {
            let request = format!(
                "Please insert medium [{}] #{} and type 'y' to continue or 'n' to cancel the operation.",
                problem.label, problem.medium_nr
            );
            return if ctx.prompter.read_bool_answer(ctx.out, ctx.exit, &request, false) {
                ctx.exit.clear();
                Action::Retry
            } else {
                Action::Abort
            };
        }

        if problem.error == MediumError::IoSoft {
            let default = if self.counter.counter_overrun(&problem.url) {
                Action::Abort
            } else {
                Action::Retry
            };
            tracing::debug!(?default, failures = self.counter.consecutive_failures(), "soft I/O error");
            let action =
                ctx.prompter
                    .read_action_ari_with_timeout(ctx.out, ctx.exit, self.prompt_timeout, default);
            if action == Action::Retry {
                ctx.exit.clear();
            }
            return action;
        }

        let action = match problem.url.scheme() {
            "https" => https_handler(problem, ctx),
            "cd" | "dvd" => dvd_handler(problem, ctx),
            _ => {
                let options = common_options("a/r/i/u");
                match ctx.prompter.ask(ctx.out, ctx.exit, ARI_TEXT, &options, None) {
                    Some(reply) => handle_common_options(reply, &mut problem.url, ctx),
                    None => Action::Abort,
                }
            }
        };

        if action == Action::Ignore && ctx.rpm_download_active && !*ctx.seen_verify_hint {
            ctx.out.info(VERIFY_HINT, Verbosity::Normal);
            *ctx.seen_verify_hint = true;
        }
        if action == Action::Retry {
            ctx.exit.clear();
        }
        action
    }
}

/// a/r/i/u plus `extra`, with the change-URI option tucked behind `...`.
fn common_options(choices: &str) -> PromptOptions {
    let mut options = PromptOptions::new(choices, 0);
    options.set_option_help(0, "Skip retrieval of the file and abort current operation.");
    options.set_option_help(1, "Try to retrieve the file again.");
    options.set_option_help(
        2,
        "Skip retrieval of the file and try to continue with the operation without the file.",
    );
    options.set_option_help(3, "Change current base URI and try retrieving the file again.");
    options.set_shown_count(3);
    options
}

fn handle_common_options(reply: usize, url: &mut Url, ctx: &mut MediumContext<'_>) -> Action {
    match reply {
        0 => Action::Abort,
        1 => Action::Retry,
        2 => Action::Ignore,
        3 => {
            let current = url.to_string();
            let answer = ctx.prompter.get_text(ctx.out, ctx.exit, "New URI", &current);
            match Url::parse(&answer) {
                Ok(new_url) => {
                    tracing::info!(old = %url, new = %new_url, "base URI changed");
                    *url = new_url;
                }
                Err(e) => {
                    ctx.out.error(
                        &format!("Invalid URI '{}': {}", answer, e),
                        Some("Keeping the current URI."),
                    );
                }
            }
            Action::Retry
        }
        other => {
            tracing::warn!(reply = other, "invalid prompt reply");
            Action::Abort
        }
    }
}

fn https_handler(problem: &mut MediumProblem, ctx: &mut MediumContext<'_>) -> Action {
    let mut options = common_options("a/r/i/u/s");
    options.set_option_help(4, "Disable SSL certificate authority check and continue.");
    match ctx.prompter.ask(ctx.out, ctx.exit, ARI_TEXT, &options, None) {
        Some(4) => {
            problem
                .url
                .query_pairs_mut()
                .append_pair("ssl_verify", "no");
            ctx.out
                .info("SSL certificate authority check disabled.", Verbosity::Normal);
            Action::Retry
        }
        Some(reply) => handle_common_options(reply, &mut problem.url, ctx),
        None => Action::Abort,
    }
}

fn dvd_handler(problem: &mut MediumProblem, ctx: &mut MediumContext<'_>) -> Action {
    let mut options = common_options("a/r/i/u/e");
    options.set_option_help(4, "Eject medium.");
    match ctx.prompter.ask(ctx.out, ctx.exit, ARI_TEXT, &options, None) {
        Some(4) => {
            eject_drive_dialog(&problem.url, &problem.devices, ctx);
            Action::Retry
        }
        Some(reply) => handle_common_options(reply, &mut problem.url, ctx),
        None => Action::Abort,
    }
}

fn eject(url: &Url, device: &str, ctx: &mut MediumContext<'_>) {
    tracing::info!(device, "ejecting");
    if let Err(e) = ctx.control.eject(url, device) {
        ctx.out.error(
            &format!("Failed to eject {}: {:#}", device, e),
            Some("Try to eject the device manually."),
        );
    }
}

fn eject_drive_dialog(url: &Url, devices: &[String], ctx: &mut MediumContext<'_>) {
    let mut cancel = false;
    match devices {
        [] => {
            ctx.out
                .info("No devices detected, cannot eject.", Verbosity::Normal);
            ctx.out
                .info("Try to eject the device manually.", Verbosity::Normal);
        }
        [device] => eject(url, device, ctx),
        _ => {
            ctx.out.info("Detected devices:", Verbosity::Normal);
            for (i, device) in devices.iter().enumerate() {
                ctx.out
                    .info(&format!("{}  {}", i + 1, device), Verbosity::Normal);
            }
            let mut choices: Vec<String> = (1..=devices.len()).map(|n| n.to_string()).collect();
            choices.push("c".to_string());
            let mut options = PromptOptions::new(&choices.join("/"), 0);
            options.set_option_help(devices.len(), "Cancel");
            match ctx
                .prompter
                .ask(ctx.out, ctx.exit, "Select device to eject.", &options, None)
            {
                Some(reply) if reply < devices.len() => eject(url, &devices[reply], ctx),
                _ => cancel = true,
            }
        }
    }

    if !cancel {
        ctx.out.info(
            "Insert the CD/DVD and press ENTER to continue.",
            Verbosity::Normal,
        );
        ctx.prompter.wait_for_enter(ctx.exit);
    }
    ctx.out.info("Retrying...", Verbosity::Normal);
}
