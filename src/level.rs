use std::fmt;

use log::debug;

/// User-facing compression aggressiveness, always within `MIN..=MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CompressionLevel(u8);

impl CompressionLevel {
    pub const MIN: u8 = 10;
    pub const MAX: u8 = 100;
    pub const DEFAULT: u8 = 70;

    /// Out-of-range values are clamped, never rejected.
    pub fn new(value: i64) -> Self {
        let clamped = value.clamp(Self::MIN as i64, Self::MAX as i64) as u8;
        if clamped as i64 != value {
            debug!("Compression level {} clamped to {}", value, clamped);
        }
        CompressionLevel(clamped)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Target output ceiling in MB handed to the image backend.
    ///
    /// Linear inversion of the level: 100 gives 0 (squeeze as hard as
    /// possible), 10 gives 9.
    pub fn size_hint_mb(self) -> f64 {
        f64::from(100 - self.0) / 10.0
    }
}

impl Default for CompressionLevel {
    fn default() -> Self {
        CompressionLevel(Self::DEFAULT)
    }
}

impl fmt::Display for CompressionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}
