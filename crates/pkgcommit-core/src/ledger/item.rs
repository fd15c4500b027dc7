//! Per-item progress records and the package reference they describe.

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

use crate::bytes::ByteCount;

/// Commit constants, fixed when the commit starts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommitTotals {
    /// Total number of packages that need to be retrieved.
    pub items_to_fetch: u32,
    /// Total number of bytes to retrieve.
    pub bytes_to_fetch: ByteCount,
    /// Total number of packages that need to be installed.
    pub items_to_install: u32,
}

impl CommitTotals {
    pub fn new(items_to_fetch: u32, bytes_to_fetch: u64, items_to_install: u32) -> Self {
        Self {
            items_to_fetch,
            bytes_to_fetch: ByteCount(bytes_to_fetch),
            items_to_install,
        }
    }
}

/// The slice of a resolvable the console needs: identity, sizes, and where it lives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRef {
    /// Resolvable kind ("package", "patch", "srcpackage", ...).
    #[serde(default = "default_kind")]
    pub kind: String,
    pub name: String,
    pub edition: String,
    #[serde(default)]
    pub arch: String,
    /// Repository-relative location, e.g. `x86_64/foo-1.0-1.x86_64.rpm`.
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub download_size: ByteCount,
    #[serde(default)]
    pub install_size: ByteCount,
}

fn default_kind() -> String {
    "package".to_string()
}

impl PackageRef {
    pub fn new(name: impl Into<String>, edition: impl Into<String>) -> Self {
        Self {
            kind: default_kind(),
            name: name.into(),
            edition: edition.into(),
            ..Self::default()
        }
    }

    pub fn with_arch(mut self, arch: impl Into<String>) -> Self {
        self.arch = arch.into();
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn with_sizes(mut self, download: u64, install: u64) -> Self {
        self.download_size = ByteCount(download);
        self.install_size = ByteCount(install);
        self
    }

    /// Ledger key: the basename of the location, or `name-edition.arch.rpm` when unknown.
    ///
    /// Two repositories shipping the same basename collide on this key.
    pub fn key(&self) -> String {
        match self.location.rsplit('/').next() {
            Some(base) if !base.is_empty() => base.to_string(),
            _ => format!("{}-{}.{}.rpm", self.name, self.edition, self.arch),
        }
    }
}

impl fmt::Display for PackageRef {
    /// `NAME-VERSION`, as used by the "Installing:" lines.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.name, self.edition)
    }
}

/// Ledger key for a file transferred from `url`: the basename of its path.
pub fn key_for_url(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|s| !s.is_empty())
        .unwrap_or_default()
        .to_string()
}

/// Progress of one in-flight download or the single in-flight install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemProgress {
    /// Position in the commit's processing order; 0 means unset.
    pub sequence_number: u32,
    /// 0..=100, or -1 while not yet started.
    pub percentage: i32,
    pub speed_current: ByteCount,
    pub speed_average: ByteCount,
    pub error_message: String,
    pub info_message: String,
    pub delta_filename: String,
    pub delta_size: ByteCount,
    /// -1 = no delta download.
    pub delta_download_pct: i32,
    /// -1 = no delta apply.
    pub delta_apply_pct: i32,
    /// The resolvable, when the engine told us (installs always, downloads usually).
    pub package: Option<PackageRef>,
}

impl Default for ItemProgress {
    fn default() -> Self {
        Self {
            sequence_number: 0,
            percentage: 0,
            speed_current: ByteCount(0),
            speed_average: ByteCount(0),
            error_message: String::new(),
            info_message: String::new(),
            delta_filename: String::new(),
            delta_size: ByteCount(0),
            delta_download_pct: -1,
            delta_apply_pct: -1,
            package: None,
        }
    }
}

impl ItemProgress {
    pub fn with_sequence(sequence_number: u32) -> Self {
        Self {
            sequence_number,
            ..Self::default()
        }
    }

    pub fn done(&self) -> bool {
        self.percentage == 100
    }

    pub fn is_empty(&self) -> bool {
        self.sequence_number == 0
    }

    pub fn has_delta(&self) -> bool {
        !self.delta_filename.is_empty()
    }

    /// Delta fetched, patch being applied onto the cached package.
    pub fn applying_delta(&self) -> bool {
        self.has_delta() && self.delta_download_pct == 100 && (0..100).contains(&self.delta_apply_pct)
    }

    /// Delta file still being fetched.
    pub fn retrieving_delta(&self) -> bool {
        self.has_delta() && self.delta_download_pct != 100
    }
}
