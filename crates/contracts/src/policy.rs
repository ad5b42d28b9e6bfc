//! FlushPolicy - when a buffered sink opens a session

use serde::{Deserialize, Serialize};

/// Flush trigger policy
///
/// Fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum FlushPolicy {
    /// Flush after every record
    #[default]
    Immediate,

    /// Flush when the buffer holds exactly `threshold` records
    Count { threshold: usize },

    /// Flush only on finalize
    Manual,
}

impl FlushPolicy {
    /// Whether a buffer of `len` records triggers a flush
    ///
    /// `Count` fires on equality only: a buffer that grows past the
    /// threshold without hitting it is held until finalize.
    pub fn triggers_at(&self, len: usize) -> bool {
        match *self {
            Self::Immediate => len >= 1,
            Self::Count { threshold } => len == threshold,
            Self::Manual => false,
        }
    }

    /// Threshold in records (`None` for manual)
    pub fn threshold(&self) -> Option<usize> {
        match *self {
            Self::Immediate => Some(1),
            Self::Count { threshold } => Some(threshold),
            Self::Manual => None,
        }
    }
}
