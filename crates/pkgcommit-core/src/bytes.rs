//! Byte quantities as shown on the console (sizes and transfer rates).

use indicatif::HumanBytes;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A byte count; `Display` renders it human-readable (`"500 B"`, `"1.50 MiB"`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ByteCount(pub u64);

impl ByteCount {
    pub const fn new(bytes: u64) -> Self {
        Self(bytes)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Rates arrive from the engine as floating bytes/second; negative or NaN means unknown.
    pub fn from_rate(rate: f64) -> Self {
        if rate.is_finite() && rate > 0.0 {
            Self(rate as u64)
        } else {
            Self(0)
        }
    }
}

impl From<u64> for ByteCount {
    fn from(bytes: u64) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for ByteCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", HumanBytes(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_counts_render_in_bytes() {
        assert_eq!(ByteCount(500).to_string(), "500 B");
        assert_eq!(ByteCount(0).to_string(), "0 B");
    }

    #[test]
    fn rates_clamp_unknown_to_zero() {
        assert_eq!(ByteCount::from_rate(-1.0), ByteCount(0));
        assert_eq!(ByteCount::from_rate(f64::NAN), ByteCount(0));
        assert_eq!(ByteCount::from_rate(2048.7), ByteCount(2048));
    }
}
