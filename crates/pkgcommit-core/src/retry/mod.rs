//! Medium retry decisions: the repeat counter, prompt plumbing and the
//! per-scheme Abort/Retry/Ignore dialogs.

mod counter;
mod medium;
mod prompt;

pub use counter::{RepeatCounter, DEFAULT_REPEAT_LIMIT};
pub use medium::{
    MediumContext, MediumControl, MediumDecider, MediumProblem, NoopMedium, VERIFY_HINT,
};
pub use prompt::{
    PromptOptions, Prompter, ReplyInput, ReplySource, ScriptedReplies, StdinReplies,
};

use serde::{Deserialize, Serialize};

/// Answer handed back to the engine for a failing medium, download or install.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Abort,
    Retry,
    Ignore,
}

impl Action {
    /// Position in an `a/r/i` prompt.
    pub fn ari_index(self) -> usize {
        match self {
            Action::Abort => 0,
            Action::Retry => 1,
            Action::Ignore => 2,
        }
    }

    pub fn from_ari_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Action::Abort),
            1 => Some(Action::Retry),
            2 => Some(Action::Ignore),
            _ => None,
        }
    }
}

/// Classification of a medium-level failure as reported by the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediumError {
    #[default]
    NoError,
    /// The requested file or medium is not there.
    NotFound,
    /// Hard I/O failure.
    Io,
    /// Transient I/O failure (connection drop, timeout).
    IoSoft,
    Invalid,
    /// A different medium is inserted.
    WrongMedium,
}

impl MediumError {
    /// The user can fix this by inserting the right disc.
    pub fn wants_medium_change(self) -> bool {
        matches!(self, MediumError::NotFound | MediumError::WrongMedium)
    }
}

/// URL schemes whose medium is swapped by hand.
pub fn is_changeable_media(url: &url::Url) -> bool {
    matches!(url.scheme(), "cd" | "dvd")
}
