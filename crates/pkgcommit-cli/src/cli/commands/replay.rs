//! `pkgcommit replay` – feed a recorded event log through the console callbacks.

use anyhow::{bail, Context, Result};
use pkgcommit_core::callbacks::{EventBus, StandardCallbacks};
use pkgcommit_core::config::PkgcommitConfig;
use pkgcommit_core::control::ExitFlag;
use pkgcommit_core::event_log::{read_event_log, replay, LogRecord, ReplayOutcome};
use pkgcommit_core::output::Output;
use pkgcommit_core::retry::Prompter;
use pkgcommit_core::session::CommitSession;
use std::path::Path;
use std::time::Duration;

pub async fn run_replay(cfg: PkgcommitConfig, file: &Path, delay_ms: u64) -> Result<()> {
    let records = read_event_log(file)?;
    tracing::info!(path = %file.display(), records = records.len(), "replaying event log");
    let outcome = drive_session(cfg, records, Duration::from_millis(delay_ms)).await?;
    finish(outcome)
}

/// Run `records` on a blocking thread, with Ctrl-C wired to the exit flag.
pub(super) async fn drive_session(
    cfg: PkgcommitConfig,
    records: Vec<LogRecord>,
    delay: Duration,
) -> Result<ReplayOutcome> {
    let exit = ExitFlag::new();
    watch_ctrl_c(exit.clone());

    tokio::task::spawn_blocking(move || {
        let output = Output::stdio(cfg.verbosity);
        let prompter = Prompter::stdin(cfg.non_interactive);
        let mut session = CommitSession::new(cfg, output, prompter, exit);
        let mut bus = EventBus::new();
        let callbacks = StandardCallbacks::connect(&mut bus);

        let outcome = replay(records, &mut session, &mut bus, |_| {
            if !delay.is_zero() {
                std::thread::sleep(delay);
            }
        });
        callbacks.disconnect(&mut bus);
        outcome
    })
    .await
    .context("replay worker panicked")
}

fn watch_ctrl_c(exit: ExitFlag) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, requesting exit");
            exit.request_exit();
        }
    });
}

pub(super) fn finish(outcome: ReplayOutcome) -> Result<()> {
    tracing::info!(
        delivered = outcome.delivered,
        aborted = outcome.aborted,
        "replay finished"
    );
    if outcome.aborted {
        bail!("operation aborted after {} events", outcome.delivered);
    }
    Ok(())
}
