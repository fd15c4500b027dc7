//! The commit session: everything an event handler needs, passed explicitly.

use std::time::Duration;

use crate::config::PkgcommitConfig;
use crate::control::ExitFlag;
use crate::ledger::{CommitTotals, ProgressLedger};
use crate::output::{Output, Verbosity};
use crate::render::TerminalRenderer;
use crate::retry::{
    Action, MediumContext, MediumControl, MediumDecider, MediumProblem, NoopMedium, Prompter,
};

/// Per-process flags the dialogs consult.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeData {
    /// A package file (not metadata) is being fetched.
    pub rpm_download_active: bool,
    /// The post-commit verify hint was already shown.
    pub seen_verify_hint: bool,
}

pub struct CommitSession {
    config: PkgcommitConfig,
    ledger: ProgressLedger,
    renderer: TerminalRenderer,
    output: Output,
    prompter: Prompter,
    medium: MediumDecider,
    medium_control: Box<dyn MediumControl + Send>,
    exit: ExitFlag,
    runtime: RuntimeData,
}

impl CommitSession {
    pub fn new(config: PkgcommitConfig, output: Output, prompter: Prompter, exit: ExitFlag) -> Self {
        let medium = MediumDecider::new(&config.medium_or_default());
        Self {
            config,
            ledger: ProgressLedger::default(),
            renderer: TerminalRenderer::new(),
            output,
            prompter,
            medium,
            medium_control: Box::new(NoopMedium),
            exit,
            runtime: RuntimeData::default(),
        }
    }

    pub fn with_medium_control(mut self, control: Box<dyn MediumControl + Send>) -> Self {
        self.medium_control = control;
        self
    }

    /// Reset the ledger and renderer for a new commit and mark it running.
    pub fn begin_commit(&mut self, totals: CommitTotals) {
        tracing::info!(
            fetch = totals.items_to_fetch,
            bytes = totals.bytes_to_fetch.get(),
            install = totals.items_to_install,
            "commit started"
        );
        self.ledger.reset(totals);
        self.ledger.set_running(true);
        self.renderer.reset();
    }

    /// Close the progress block and mark the commit finished.
    pub fn end_commit(&mut self) {
        if !self.ledger.is_running() {
            return;
        }
        self.renderer.finish(&mut self.output);
        self.ledger.set_running(false);
        self.runtime.rpm_download_active = false;
        tracing::info!(
            downloads = self.ledger.last_download_seq(),
            installs = self.ledger.last_install_seq(),
            "commit finished"
        );
    }

    pub fn is_commit_running(&self) -> bool {
        self.ledger.is_running()
    }

    /// Draw a frame of the running commit; no-op outside a commit or when quiet.
    pub fn render(&mut self) {
        if !self.ledger.is_running() || self.output.verbosity() == Verbosity::Quiet {
            return;
        }
        self.renderer.render(&self.ledger, &mut self.output);
    }

    /// Abort/Retry/Ignore prompt for a per-item problem.
    pub fn ask_action(&mut self, default: Action) -> Action {
        self.prompter
            .read_action_ari(&mut self.output, &self.exit, default)
    }

    /// Run the medium dialog; `problem.url` may come back rewritten.
    pub fn request_medium(&mut self, problem: &mut MediumProblem) -> Action {
        let mut ctx = MediumContext {
            out: &mut self.output,
            prompter: &mut self.prompter,
            exit: &self.exit,
            control: self.medium_control.as_mut(),
            rpm_download_active: self.runtime.rpm_download_active,
            seen_verify_hint: &mut self.runtime.seen_verify_hint,
        };
        self.medium.request_medium(problem, &mut ctx)
    }

    pub fn request_exit(&self) {
        self.exit.request_exit();
    }

    pub fn exit_requested(&self) -> bool {
        self.exit.is_requested()
    }

    pub fn exit_flag(&self) -> &ExitFlag {
        &self.exit
    }

    pub fn config(&self) -> &PkgcommitConfig {
        &self.config
    }

    pub fn render_interval(&self) -> Duration {
        self.config.render_interval()
    }

    pub fn ledger(&self) -> &ProgressLedger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut ProgressLedger {
        &mut self.ledger
    }

    pub fn renderer(&self) -> &TerminalRenderer {
        &self.renderer
    }

    pub fn out(&mut self) -> &mut Output {
        &mut self.output
    }

    pub fn verbosity(&self) -> Verbosity {
        self.output.verbosity()
    }

    pub fn runtime(&self) -> RuntimeData {
        self.runtime
    }

    pub fn set_rpm_download_active(&mut self, active: bool) {
        self.runtime.rpm_download_active = active;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytes::ByteCount;
    use crate::retry::{MediumError, VERIFY_HINT};
    use crate::test_support::{test_session, SharedBuf};
    use url::Url;

    fn session(replies: &[&str]) -> (CommitSession, SharedBuf) {
        let (session, stdout, _) = test_session(Verbosity::Normal, true, replies);
        (session, stdout)
    }

    #[test]
    fn render_only_while_running() {
        let (mut s, stdout) = session(&[]);
        s.ledger_mut().on_download_start("a.rpm");
        s.render();
        assert_eq!(stdout.contents(), "");

        s.begin_commit(CommitTotals::new(1, 100, 1));
        assert!(s.is_commit_running());
        s.ledger_mut().on_download_start("a.rpm");
        s.render();
        assert!(stdout.contents().contains("Retrieving a.rpm [0% (0 B/s)]"));

        s.end_commit();
        assert!(!s.is_commit_running());
        assert!(stdout.contents().ends_with("Retrieving 1 of 1 0% ETA -:--\n"));
    }

    #[test]
    fn begin_commit_resets_previous_state() {
        let (mut s, _) = session(&[]);
        s.begin_commit(CommitTotals::new(2, 0, 2));
        s.ledger_mut().on_download_start("a.rpm");
        s.ledger_mut().on_download_finish("a.rpm", ByteCount(1));
        s.end_commit();
        s.begin_commit(CommitTotals::new(3, 0, 3));
        assert_eq!(s.ledger().last_download_seq(), 0);
        assert!(s.ledger().recently_finished().is_empty());
        assert_eq!(s.ledger().totals().items_to_fetch, 3);
    }

    #[test]
    fn medium_problem_uses_session_flags() {
        let (mut s, stdout) = session(&["i", "i"]);
        s.set_rpm_download_active(true);
        let mut problem = MediumProblem {
            url: Url::parse("http://mirror.example.org/a.rpm").unwrap(),
            medium_nr: 1,
            label: String::new(),
            error: MediumError::Io,
            description: "Download failed".into(),
            devices: Vec::new(),
        };
        assert_eq!(s.request_medium(&mut problem), Action::Ignore);
        assert_eq!(s.request_medium(&mut problem), Action::Ignore);
        assert!(s.runtime().seen_verify_hint);
        assert_eq!(stdout.contents().matches(VERIFY_HINT).count(), 1);
    }

    #[test]
    fn ask_action_resolves_to_abort_on_exit() {
        let (mut s, _) = session(&["r"]);
        s.request_exit();
        assert_eq!(s.ask_action(Action::Retry), Action::Abort);
        assert!(s.exit_requested());
    }
}
