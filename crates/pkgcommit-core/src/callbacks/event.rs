//! Engine events and the replies handlers give back.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::bytes::ByteCount;
use crate::ledger::PackageRef;
use crate::retry::{Action, MediumError};

/// One callback from the package-management engine.
///
/// Serialized with an `event` tag, e.g. `{"event":"install_progress","percent":40}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    // media-level file transfers
    DownloadStart {
        url: Url,
        #[serde(default)]
        local_path: Option<String>,
    },
    DownloadProgress {
        url: Url,
        percent: i32,
        /// Average rate in bytes/s; negative when unknown.
        #[serde(default)]
        rate_avg: f64,
        #[serde(default)]
        rate_now: f64,
    },
    DownloadProblem {
        url: Url,
        #[serde(default)]
        error: MediumError,
        description: String,
    },
    DownloadFinish {
        url: Url,
        /// Failure reason; absent on success.
        #[serde(default)]
        error: Option<String>,
    },

    // resolvable-level downloads
    ResolvableDownloadStart {
        package: PackageRef,
        url: Url,
    },
    ResolvableProblem {
        package: PackageRef,
        description: String,
    },
    ResolvableDownloadFinish {
        package: PackageRef,
        #[serde(default)]
        error: Option<String>,
    },
    DeltaDownloadStart {
        filename: String,
        #[serde(default)]
        size: ByteCount,
    },
    DeltaDownloadProgress {
        percent: i32,
        #[serde(default)]
        rate_now: f64,
    },
    DeltaDownloadProblem {
        description: String,
    },
    DeltaDownloadFinish,
    DeltaApplyStart {
        filename: String,
    },
    DeltaApplyProgress {
        percent: i32,
    },
    DeltaApplyProblem {
        description: String,
    },
    DeltaApplyFinish,
    PatchDownloadStart {
        filename: String,
        #[serde(default)]
        size: ByteCount,
    },
    PatchDownloadProblem {
        description: String,
    },

    // installs
    InstallStart {
        package: PackageRef,
    },
    InstallProgress {
        percent: i32,
    },
    InstallProblem {
        description: String,
    },
    InstallFinish {
        #[serde(default)]
        error: Option<String>,
        /// Extra note shown under the "Installed" line.
        #[serde(default)]
        info: Option<String>,
    },

    MediumProblem {
        url: Url,
        #[serde(default)]
        medium_nr: u32,
        #[serde(default)]
        label: String,
        error: MediumError,
        #[serde(default)]
        description: String,
        #[serde(default)]
        devices: Vec<String>,
    },

    // generic progress
    ProgressStart {
        id: String,
        name: String,
        #[serde(default)]
        indeterminate: bool,
    },
    ProgressUpdate {
        id: String,
        name: String,
        #[serde(default)]
        indeterminate: bool,
        #[serde(default)]
        value: i32,
    },
    ProgressFinish {
        id: String,
        name: String,
        #[serde(default)]
        error: bool,
    },

    // repository refresh
    RepoStart {
        repo: String,
        task: String,
    },
    RepoProgress {
        task: String,
        value: i32,
    },
    RepoProblem {
        description: String,
    },
    RepoFinish {
        #[serde(default)]
        error: Option<String>,
    },
}

impl EngineEvent {
    /// The `event` tag, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            EngineEvent::DownloadStart { .. } => "download_start",
            EngineEvent::DownloadProgress { .. } => "download_progress",
            EngineEvent::DownloadProblem { .. } => "download_problem",
            EngineEvent::DownloadFinish { .. } => "download_finish",
            EngineEvent::ResolvableDownloadStart { .. } => "resolvable_download_start",
            EngineEvent::ResolvableProblem { .. } => "resolvable_problem",
            EngineEvent::ResolvableDownloadFinish { .. } => "resolvable_download_finish",
            EngineEvent::DeltaDownloadStart { .. } => "delta_download_start",
            EngineEvent::DeltaDownloadProgress { .. } => "delta_download_progress",
            EngineEvent::DeltaDownloadProblem { .. } => "delta_download_problem",
            EngineEvent::DeltaDownloadFinish => "delta_download_finish",
            EngineEvent::DeltaApplyStart { .. } => "delta_apply_start",
            EngineEvent::DeltaApplyProgress { .. } => "delta_apply_progress",
            EngineEvent::DeltaApplyProblem { .. } => "delta_apply_problem",
            EngineEvent::DeltaApplyFinish => "delta_apply_finish",
            EngineEvent::PatchDownloadStart { .. } => "patch_download_start",
            EngineEvent::PatchDownloadProblem { .. } => "patch_download_problem",
            EngineEvent::InstallStart { .. } => "install_start",
            EngineEvent::InstallProgress { .. } => "install_progress",
            EngineEvent::InstallProblem { .. } => "install_problem",
            EngineEvent::InstallFinish { .. } => "install_finish",
            EngineEvent::MediumProblem { .. } => "medium_problem",
            EngineEvent::ProgressStart { .. } => "progress_start",
            EngineEvent::ProgressUpdate { .. } => "progress_update",
            EngineEvent::ProgressFinish { .. } => "progress_finish",
            EngineEvent::RepoStart { .. } => "repo_start",
            EngineEvent::RepoProgress { .. } => "repo_progress",
            EngineEvent::RepoProblem { .. } => "repo_problem",
            EngineEvent::RepoFinish { .. } => "repo_finish",
        }
    }
}

/// What a handler hands back to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reply {
    /// Notification handled; nothing to return.
    Ack,
    /// Answer to a progress callback: keep going?
    Continue(bool),
    Action(Action),
}

impl Reply {
    /// The engine should stop the running operation.
    pub fn is_abort(self) -> bool {
        matches!(self, Reply::Continue(false) | Reply::Action(Action::Abort))
    }
}
