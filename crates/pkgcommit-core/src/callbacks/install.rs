//! Install receiver: the single in-flight package install.

use std::time::Instant;

use crate::output::Verbosity;
use crate::retry::Action;
use crate::session::CommitSession;
use crate::throttle::ReportThrottle;

use super::{EngineEvent, Receiver, Reply};

/// Package installs. Strictly serial: one install runs at a time.
#[derive(Debug, Clone, Default)]
pub struct InstallReceiver {
    throttle: ReportThrottle,
}

impl Receiver for InstallReceiver {
    fn receive(&mut self, session: &mut CommitSession, event: &mut EngineEvent) -> Option<Reply> {
        match event {
            EngineEvent::InstallStart { package } => {
                tracing::debug!(package = %package, "install start");
                self.throttle = ReportThrottle::new(session.render_interval());
                self.throttle.force(Instant::now());
                if session.is_commit_running() {
                    session.ledger_mut().on_install_start(package.clone());
                    session.render();
                } else {
                    session
                        .out()
                        .info(&format!("Installing: {}", package), Verbosity::Normal);
                }
                Some(Reply::Ack)
            }
            EngineEvent::InstallProgress { percent } => {
                if session.exit_requested() {
                    return Some(Reply::Continue(false));
                }
                session.ledger_mut().on_install_progress(*percent);
                if self.throttle.ready(Instant::now()) {
                    session.render();
                }
                Some(Reply::Continue(true))
            }
            EngineEvent::InstallProblem { description } => {
                session.out().error(description, None);
                let action = session.ask_action(Action::Abort);
                if action != Action::Retry {
                    session.ledger_mut().on_install_failed(description);
                    session.render();
                }
                Some(Reply::Action(action))
            }
            EngineEvent::InstallFinish { error, info } => {
                match error {
                    None => session.ledger_mut().on_install_finish_with(info.as_deref()),
                    Some(reason) => {
                        session.out().error(reason, None);
                        session.ledger_mut().on_install_failed(reason);
                    }
                }
                session.render();
                Some(Reply::Ack)
            }
            _ => None,
        }
    }
}
