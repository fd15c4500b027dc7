//! `pkgcommit config` – show where settings live and what is in effect.

use anyhow::Result;
use pkgcommit_core::config::{self, PkgcommitConfig};
use pkgcommit_core::logging;

pub fn run_config(cfg: &PkgcommitConfig) -> Result<()> {
    println!("config file: {}", config::config_path()?.display());
    println!("log file:    {}", logging::log_file_path()?.display());
    println!();
    print!("{}", cfg.to_toml_string()?);
    Ok(())
}
