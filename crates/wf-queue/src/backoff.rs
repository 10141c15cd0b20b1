use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "type")]
pub enum BackoffStrategy {
    Exponential { delay_ms: u64 },
    Fixed { delay_ms: u64 },
}

impl Default for BackoffStrategy {
    fn default() -> Self {
        BackoffStrategy::Exponential { delay_ms: 30_000 }
    }
}

impl BackoffStrategy {
    /// Delay before the attempt numbered `attempts_made` (0-based, the
    /// count of attempts already made before this retry).
    pub fn delay_ms(&self, attempts_made: u32) -> u64 {
        match self {
            BackoffStrategy::Fixed { delay_ms } => *delay_ms,
            BackoffStrategy::Exponential { delay_ms } => {
                delay_ms.saturating_mul(1u64 << attempts_made.min(20))
            }
        }
    }
}
