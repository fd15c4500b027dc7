//! Engine callback receivers and the bus that dispatches to them.
//!
//! Receivers are registered explicitly and get the session passed in on
//! every event; no handler reaches for global state.

mod event;
mod install;
mod media;
mod repo;

pub use event::{EngineEvent, Reply};
pub use install::InstallReceiver;
pub use media::{DownloadProgressReceiver, MediaChangeReceiver};
pub use repo::{DownloadResolvableReceiver, ProgressReceiver, RepoReceiver};

use crate::session::CommitSession;

/// Handles some subset of engine events.
pub trait Receiver: Send {
    /// `None` when the event is not for this receiver. The event is mutable
    /// so dialogs can hand values back (a rewritten URL).
    fn receive(&mut self, session: &mut CommitSession, event: &mut EngineEvent) -> Option<Reply>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReceiverId(u64);

/// Ordered list of connected receivers.
#[derive(Default)]
pub struct EventBus {
    receivers: Vec<(ReceiverId, Box<dyn Receiver>)>,
    next_id: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&mut self, receiver: Box<dyn Receiver>) -> ReceiverId {
        let id = ReceiverId(self.next_id);
        self.next_id += 1;
        self.receivers.push((id, receiver));
        id
    }

    /// Returns false if `id` was not connected.
    pub fn disconnect(&mut self, id: ReceiverId) -> bool {
        let before = self.receivers.len();
        self.receivers.retain(|(rid, _)| *rid != id);
        self.receivers.len() != before
    }

    pub fn len(&self) -> usize {
        self.receivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receivers.is_empty()
    }

    /// Deliver `event` to receivers in connection order; the first reply wins.
    pub fn emit(&mut self, session: &mut CommitSession, event: &mut EngineEvent) -> Reply {
        tracing::debug!(event = event.name(), "dispatch");
        for (_, receiver) in self.receivers.iter_mut() {
            if let Some(reply) = receiver.receive(session, event) {
                return reply;
            }
        }
        tracing::debug!(event = event.name(), "no receiver");
        Reply::Ack
    }
}

/// The standard receiver set of the console frontend.
pub struct StandardCallbacks;

impl StandardCallbacks {
    pub fn connect(bus: &mut EventBus) -> CallbackSet {
        let ids = vec![
            bus.connect(Box::new(MediaChangeReceiver)),
            bus.connect(Box::new(DownloadProgressReceiver::default())),
            bus.connect(Box::new(DownloadResolvableReceiver::default())),
            bus.connect(Box::new(InstallReceiver::default())),
            bus.connect(Box::new(ProgressReceiver)),
            bus.connect(Box::new(RepoReceiver::default())),
        ];
        CallbackSet { ids }
    }
}

/// Registration handle returned by [`StandardCallbacks::connect`].
#[derive(Debug)]
#[must_use = "dropping the set keeps the receivers connected; call disconnect"]
pub struct CallbackSet {
    ids: Vec<ReceiverId>,
}

impl CallbackSet {
    pub fn ids(&self) -> &[ReceiverId] {
        &self.ids
    }

    pub fn disconnect(self, bus: &mut EventBus) {
        for id in self.ids {
            bus.disconnect(id);
        }
    }
}
