//! CLI for the pkgcommit console frontend.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use pkgcommit_core::config::{self, PkgcommitConfig};
use std::path::PathBuf;

use commands::{run_completions, run_config, run_demo, run_man, run_replay, DemoPlan};

/// Top-level CLI for pkgcommit.
#[derive(Debug, Parser)]
#[command(name = "pkgcommit")]
#[command(about = "pkgcommit: commit progress and medium retry console", long_about = None)]
pub struct Cli {
    /// More output; repeat for debug detail.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only errors and prompts.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Never wait for input; every prompt takes its default answer.
    #[arg(long, global = true)]
    pub non_interactive: bool,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Replay a recorded engine event log through the console callbacks.
    Replay {
        /// Path to the JSON-lines event log.
        file: PathBuf,

        /// Pause between records, in milliseconds.
        #[arg(long, default_value = "0", value_name = "MS")]
        delay_ms: u64,
    },

    /// Run a synthetic commit to preview the progress display.
    Demo {
        /// Number of packages to download.
        #[arg(long, default_value = "5", value_name = "N")]
        downloads: u32,

        /// Number of packages to install.
        #[arg(long, default_value = "5", value_name = "N")]
        installs: u32,

        /// Downloads in flight at the same time.
        #[arg(long, default_value = "2", value_name = "N")]
        parallel: u32,

        /// Pause between events, in milliseconds.
        #[arg(long, default_value = "80", value_name = "MS")]
        delay_ms: u64,
    },

    /// Show the config file path and the effective settings.
    Config,

    /// Print shell completions to stdout.
    Completions {
        /// Target shell.
        shell: Shell,
    },

    /// Print the man page to stdout.
    Man,
}

impl Cli {
    /// Layer the global flags over the loaded config.
    pub fn apply_overrides(&self, mut cfg: PkgcommitConfig) -> PkgcommitConfig {
        cfg.verbosity = cfg.verbosity.adjusted(self.verbose, self.quiet);
        cfg.non_interactive |= self.non_interactive;
        cfg
    }
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        // these never touch the config
        match &cli.command {
            CliCommand::Completions { shell } => return run_completions(*shell),
            CliCommand::Man => return run_man(),
            _ => {}
        }

        let cfg = cli.apply_overrides(config::load_or_init()?);
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Replay { file, delay_ms } => run_replay(cfg, &file, delay_ms).await?,
            CliCommand::Demo {
                downloads,
                installs,
                parallel,
                delay_ms,
            } => {
                let plan = DemoPlan {
                    downloads,
                    installs,
                    parallel,
                };
                run_demo(cfg, plan, delay_ms).await?;
            }
            CliCommand::Config => run_config(&cfg)?,
            CliCommand::Completions { .. } | CliCommand::Man => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
