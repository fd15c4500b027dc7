use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::output::Verbosity;

/// Medium retry parameters (optional section in config.toml).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediumConfig {
    /// Consecutive soft I/O failures of one URL before the default answer becomes Abort.
    pub repeat_limit: u32,
    /// How long the soft I/O prompt waits for a reply before taking the default.
    pub prompt_timeout_secs: u64,
}

impl Default for MediumConfig {
    fn default() -> Self {
        Self {
            repeat_limit: 3,
            prompt_timeout_secs: 30,
        }
    }
}

impl MediumConfig {
    pub fn prompt_timeout(&self) -> Duration {
        Duration::from_secs(self.prompt_timeout_secs)
    }
}

/// Global configuration loaded from `~/.config/pkgcommit/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PkgcommitConfig {
    /// Console verbosity: "quiet", "normal", "high" or "debug".
    #[serde(default)]
    pub verbosity: Verbosity,
    /// Never wait for input; every prompt takes its default answer.
    #[serde(default)]
    pub non_interactive: bool,
    /// Minimum milliseconds between progress-update renders of one stream.
    #[serde(default = "default_render_interval_ms")]
    pub render_interval_ms: u64,
    /// Optional medium retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub medium: Option<MediumConfig>,
}

fn default_render_interval_ms() -> u64 {
    1000
}

impl Default for PkgcommitConfig {
    fn default() -> Self {
        Self {
            verbosity: Verbosity::Normal,
            non_interactive: false,
            render_interval_ms: default_render_interval_ms(),
            medium: None,
        }
    }
}

impl PkgcommitConfig {
    pub fn render_interval(&self) -> Duration {
        Duration::from_millis(self.render_interval_ms)
    }

    /// The medium section, or its defaults when absent.
    pub fn medium_or_default(&self) -> MediumConfig {
        self.medium.clone().unwrap_or_default()
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("pkgcommit")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<PkgcommitConfig> {
    let path = config_path()?;
    load_or_init_at(&path)
}

/// Same as [`load_or_init`] for an explicit path.
pub fn load_or_init_at(path: &Path) -> Result<PkgcommitConfig> {
    if !path.exists() {
        let default_cfg = PkgcommitConfig::default();
        let toml = default_cfg.to_toml_string()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml).with_context(|| format!("write config: {}", path.display()))?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data =
        fs::read_to_string(path).with_context(|| format!("read config: {}", path.display()))?;
    let cfg: PkgcommitConfig =
        toml::from_str(&data).with_context(|| format!("parse config: {}", path.display()))?;
    Ok(cfg)
}
