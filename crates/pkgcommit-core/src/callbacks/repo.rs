//! Repository-side receivers: package downloads, generic progress and
//! repository refresh.

use std::collections::BTreeSet;
use std::time::Instant;

use crate::bytes::ByteCount;
use crate::ledger::{PackageRef, ProgressLedger};
use crate::output::Verbosity;
use crate::retry::Action;
use crate::session::CommitSession;
use crate::throttle::ReportThrottle;

use super::{EngineEvent, Receiver, Reply};

/// Download of one package, with its delta and patch sub-steps.
///
/// Delta and patch events refer to the package of the last start event,
/// which stays current until that package itself finishes.
#[derive(Debug, Clone, Default)]
pub struct DownloadResolvableReceiver {
    current: Option<PackageRef>,
    /// Keys of package downloads started and not yet finished or dropped.
    in_flight: BTreeSet<String>,
    /// Packages announced outside a commit, for the "(n/N)" counter.
    started: u32,
    throttle: ReportThrottle,
}

impl DownloadResolvableReceiver {
    fn current_key(&self) -> Option<String> {
        self.current.as_ref().map(PackageRef::key)
    }

    fn start(&mut self, session: &mut CommitSession, package: &PackageRef) {
        if session.is_commit_running() && session.ledger().last_download_seq() == 0 {
            // first download of a new commit; drop leftovers of an aborted one
            self.in_flight.clear();
        }
        self.current = Some(package.clone());
        self.in_flight.insert(package.key());
        self.throttle = ReportThrottle::new(session.render_interval());
        self.throttle.force(Instant::now());
        session.set_rpm_download_active(true);

        if session.is_commit_running() {
            let item = session.ledger_mut().on_download_start(&package.key());
            item.package = Some(package.clone());
            session.render();
        } else {
            self.started += 1;
            let total = session.ledger().totals().items_to_fetch;
            let counter = if total > 0 {
                format!("{}/{}", self.started, total)
            } else {
                self.started.to_string()
            };
            let line = format!(
                "Retrieving {} {}.{} ({}), {} ({} unpacked)",
                package.kind, package, package.arch, counter, package.download_size, package.install_size
            );
            session.out().info(&line, Verbosity::Normal);
        }
    }

    /// Forget `key`; the RPM-fetch flag stays up while other downloads run.
    fn settle(&mut self, session: &mut CommitSession, key: &str) {
        self.in_flight.remove(key);
        if self.current_key().as_deref() == Some(key) {
            self.current = None;
        }
        session.set_rpm_download_active(!self.in_flight.is_empty());
    }

    fn problem(&mut self, session: &mut CommitSession, package: &PackageRef, description: &str) -> Action {
        session.out().error(description, None);
        let action = session.ask_action(Action::Abort);
        if action != Action::Retry {
            // the engine gives up on this file
            self.settle(session, &package.key());
            if session
                .ledger_mut()
                .on_download_failed(&package.key(), description)
                .is_some()
            {
                session.render();
            }
        }
        action
    }

    fn finish(&mut self, session: &mut CommitSession, package: &PackageRef, error: Option<&str>) {
        let key = package.key();
        if session.is_commit_running() {
            match error {
                None => {
                    session.ledger_mut().on_download_finish(&key, ByteCount(0));
                }
                Some(reason) => {
                    session.out().error(reason, None);
                    session.ledger_mut().on_download_failed(&key, reason);
                }
            }
            session.render();
        } else if let Some(reason) = error {
            session.out().error(reason, None);
        }
        self.settle(session, &key);
    }

    /// Apply `f` to the ledger under the current package key, then render.
    fn with_current(
        &mut self,
        session: &mut CommitSession,
        throttled: bool,
        f: impl FnOnce(&mut ProgressLedger, &str) -> bool,
    ) {
        let Some(key) = self.current_key() else {
            tracing::debug!("delta event without a current package");
            return;
        };
        let changed = f(session.ledger_mut(), &key);
        let ready = !throttled || self.throttle.ready(Instant::now());
        if changed && ready {
            session.render();
        }
    }
}

impl Receiver for DownloadResolvableReceiver {
    fn receive(&mut self, session: &mut CommitSession, event: &mut EngineEvent) -> Option<Reply> {
        match event {
            EngineEvent::ResolvableDownloadStart { package, url } => {
                tracing::debug!(package = %package, %url, "package download start");
                self.start(session, package);
            }
            EngineEvent::ResolvableProblem {
                package,
                description,
            } => {
                return Some(Reply::Action(self.problem(session, package, description)));
            }
            EngineEvent::ResolvableDownloadFinish { package, error } => {
                self.finish(session, package, error.as_deref());
            }
            EngineEvent::DeltaDownloadStart { filename, size } => {
                let (filename, size) = (filename.clone(), *size);
                self.with_current(session, false, |l, key| {
                    l.on_delta_download_start(key, &filename, size)
                });
            }
            EngineEvent::DeltaDownloadProgress { percent, rate_now } => {
                let (percent, rate) = (*percent, ByteCount::from_rate(*rate_now));
                self.with_current(session, true, |l, key| {
                    l.on_delta_download_progress(key, percent, rate)
                });
                if session.exit_requested() {
                    return Some(Reply::Continue(false));
                }
                return Some(Reply::Continue(true));
            }
            EngineEvent::DeltaDownloadFinish => {
                self.with_current(session, false, |l, key| l.on_delta_download_finish(key));
            }
            EngineEvent::DeltaApplyStart { filename } => {
                tracing::debug!(%filename, "applying delta");
                self.with_current(session, false, |l, key| l.on_delta_apply_start(key));
            }
            EngineEvent::DeltaApplyProgress { percent } => {
                let percent = *percent;
                self.with_current(session, true, |l, key| l.on_delta_apply_progress(key, percent));
            }
            EngineEvent::DeltaApplyFinish => {
                self.with_current(session, false, |l, key| l.on_delta_apply_finish(key));
            }
            EngineEvent::DeltaDownloadProblem { description }
            | EngineEvent::PatchDownloadProblem { description } => {
                session.out().error(description, None);
            }
            EngineEvent::DeltaApplyProblem { description } => {
                // the engine falls back to the full package
                tracing::warn!(%description, "delta apply failed");
            }
            EngineEvent::PatchDownloadStart { filename, size } => {
                let line = format!("Retrieving patch rpm: {}, {}", filename, size);
                session.out().info(&line, Verbosity::Normal);
            }
            _ => return None,
        }
        Some(Reply::Ack)
    }
}

/// Generic labelled progress, forwarded to the output sink.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProgressReceiver;

impl Receiver for ProgressReceiver {
    fn receive(&mut self, session: &mut CommitSession, event: &mut EngineEvent) -> Option<Reply> {
        match event {
            EngineEvent::ProgressStart {
                id,
                name,
                indeterminate,
            } => {
                session.out().progress_start(id, name, *indeterminate);
                Some(Reply::Ack)
            }
            EngineEvent::ProgressUpdate {
                id,
                name,
                indeterminate,
                value,
            } => {
                let value = (!*indeterminate).then_some(*value);
                session.out().progress(id, name, value);
                Some(Reply::Continue(!session.exit_requested()))
            }
            EngineEvent::ProgressFinish { id, name, error } => {
                session.out().progress_end(id, name, *error);
                Some(Reply::Ack)
            }
            _ => None,
        }
    }
}

const REPO_PROGRESS_ID: &str = "repo";

/// Repository refresh progress, labelled `(REPO) TASK`.
#[derive(Debug, Clone, Default)]
pub struct RepoReceiver {
    repo: String,
}

impl RepoReceiver {
    fn label(&self, task: &str) -> String {
        format!("({}) {}", self.repo, task)
    }
}

impl Receiver for RepoReceiver {
    fn receive(&mut self, session: &mut CommitSession, event: &mut EngineEvent) -> Option<Reply> {
        match event {
            EngineEvent::RepoStart { repo, task } => {
                self.repo = repo.clone();
                let label = self.label(task);
                session.out().progress_start(REPO_PROGRESS_ID, &label, false);
                Some(Reply::Ack)
            }
            EngineEvent::RepoProgress { task, value } => {
                let label = self.label(task);
                session.out().progress(REPO_PROGRESS_ID, &label, Some(*value));
                Some(Reply::Continue(!session.exit_requested()))
            }
            EngineEvent::RepoProblem { description } => {
                let label = self.label("");
                session.out().progress_end(REPO_PROGRESS_ID, &label, true);
                session.out().error(description, None);
                Some(Reply::Action(session.ask_action(Action::Abort)))
            }
            EngineEvent::RepoFinish { error } => {
                let label = self.label("");
                session
                    .out()
                    .progress_end(REPO_PROGRESS_ID, &label, error.is_some());
                if let Some(reason) = error {
                    session.out().error(reason, None);
                }
                Some(Reply::Ack)
            }
            _ => None,
        }
    }
}
