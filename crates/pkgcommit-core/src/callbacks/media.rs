//! Media-level receivers: medium problems and single-file transfers.

use std::time::Instant;

use crate::bytes::ByteCount;
use crate::ledger::key_for_url;
use crate::output::Verbosity;
use crate::retry::{Action, MediumProblem};
use crate::session::CommitSession;
use crate::throttle::ReportThrottle;

use super::{EngineEvent, Receiver, Reply};

/// Routes medium problems through the retry dialogs.
#[derive(Debug, Default, Clone, Copy)]
pub struct MediaChangeReceiver;

impl Receiver for MediaChangeReceiver {
    fn receive(&mut self, session: &mut CommitSession, event: &mut EngineEvent) -> Option<Reply> {
        let EngineEvent::MediumProblem {
            url,
            medium_nr,
            label,
            error,
            description,
            devices,
        } = event
        else {
            return None;
        };
        let mut problem = MediumProblem {
            url: url.clone(),
            medium_nr: *medium_nr,
            label: label.clone(),
            error: *error,
            description: description.clone(),
            devices: devices.clone(),
        };
        let action = session.request_medium(&mut problem);
        if problem.url != *url {
            tracing::debug!(old = %url, new = %problem.url, "medium URL rewritten");
            *url = problem.url;
        }
        Some(Reply::Action(action))
    }
}

/// Progress of one file transfer.
///
/// Outside a commit it draws a single `Retrieving:` line, and only at high
/// verbosity. During a commit it feeds the ledger instead.
#[derive(Debug, Clone, Default)]
pub struct DownloadProgressReceiver {
    be_quiet: bool,
    throttle: ReportThrottle,
    last_rate_avg: Option<ByteCount>,
}

impl DownloadProgressReceiver {
    fn rate(&self) -> Option<ByteCount> {
        self.last_rate_avg.filter(|r| !r.is_zero())
    }
}

impl Receiver for DownloadProgressReceiver {
    fn receive(&mut self, session: &mut CommitSession, event: &mut EngineEvent) -> Option<Reply> {
        match event {
            EngineEvent::DownloadStart { url, local_path } => {
                tracing::debug!(%url, ?local_path, "file download start");
                self.throttle = ReportThrottle::new(session.render_interval());
                self.throttle.force(Instant::now());
                self.last_rate_avg = None;
                self.be_quiet = session.verbosity() < Verbosity::High;
                if !session.is_commit_running() && !self.be_quiet {
                    session.out().download_progress_start(url);
                }
                Some(Reply::Ack)
            }
            EngineEvent::DownloadProgress {
                url,
                percent,
                rate_avg,
                rate_now,
            } => {
                if session.exit_requested() {
                    tracing::debug!("received exit request");
                    return Some(Reply::Continue(false));
                }
                self.last_rate_avg = Some(ByteCount::from_rate(*rate_avg));
                let rate_now = ByteCount::from_rate(*rate_now);
                let ready = self.throttle.ready(Instant::now());
                if session.is_commit_running() {
                    session
                        .ledger_mut()
                        .on_download_progress(&key_for_url(url), *percent, rate_now);
                    if ready {
                        session.render();
                    }
                } else if ready && !self.be_quiet {
                    session.out().download_progress(url, *percent, Some(rate_now));
                }
                Some(Reply::Continue(true))
            }
            EngineEvent::DownloadProblem {
                url,
                error,
                description,
            } => {
                tracing::debug!(%url, ?error, "download problem");
                if !self.be_quiet && !session.is_commit_running() {
                    let rate = self.rate();
                    session.out().download_progress_end(url, rate, true);
                }
                session.out().error(description, None);
                let action = session.ask_action(Action::Abort);
                if action == Action::Retry {
                    session.exit_flag().clear();
                }
                Some(Reply::Action(action))
            }
            EngineEvent::DownloadFinish { url, error } => {
                let rate = self.rate();
                if session.is_commit_running() {
                    session
                        .ledger_mut()
                        .on_transfer_done(&key_for_url(url), rate.unwrap_or_default());
                    session.render();
                } else if !self.be_quiet {
                    session.out().download_progress_end(url, rate, error.is_some());
                }
                Some(Reply::Ack)
            }
            _ => None,
        }
    }
}
