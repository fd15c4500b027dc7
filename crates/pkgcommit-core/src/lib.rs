pub mod config;
pub mod logging;

pub mod bytes;
pub mod callbacks;
pub mod control;
pub mod event_log;
pub mod ledger;
pub mod output;
pub mod render;
pub mod retry;
pub mod session;
pub mod throttle;

#[cfg(test)]
pub(crate) mod test_support;
