//! CLI command handlers, one file per command.

mod completions;
mod config;
mod demo;
mod man;
mod replay;

pub use completions::run_completions;
pub use config::run_config;
pub use demo::{run_demo, DemoPlan};
pub use man::run_man;
pub use replay::run_replay;
