use url::Url;

/// Consecutive soft failures of one URL after which the default flips to Abort.
pub const DEFAULT_REPEAT_LIMIT: u32 = 3;

/// Counts consecutive failures of the most recently failing URL.
///
/// Only one URL is remembered: a failure of any other URL starts over.
#[derive(Debug, Clone)]
pub struct RepeatCounter {
    last_url: Option<Url>,
    consecutive_failures: u32,
    limit: u32,
}

impl Default for RepeatCounter {
    fn default() -> Self {
        Self::new(DEFAULT_REPEAT_LIMIT)
    }
}

impl RepeatCounter {
    pub fn new(limit: u32) -> Self {
        Self {
            last_url: None,
            consecutive_failures: 0,
            limit,
        }
    }

    /// Record a failure of `url`; true once the same URL has failed past the limit.
    ///
    /// Unlike a single-shot check that flips only on the failure that reaches
    /// the limit, this stays true for every further failure of the same URL.
    pub fn counter_overrun(&mut self, url: &Url) -> bool {
        if self.last_url.as_ref() == Some(url) {
            self.consecutive_failures = self.consecutive_failures.saturating_add(1);
            self.consecutive_failures >= self.limit
        } else {
            self.last_url = Some(url.clone());
            self.consecutive_failures = 0;
            false
        }
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn last_url(&self) -> Option<&Url> {
        self.last_url.as_ref()
    }
}
