//! Outcome summary of an orchestration run.

use aesop_core::StoryStatus;
use serde::{Deserialize, Serialize};

/// What one orchestration run accomplished.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IllustrationReport {
    /// Final story status after the run
    pub status: StoryStatus,
    /// Number of pages the run was responsible for
    pub total_pages: usize,
    /// Pages holding an image reference when the run finished
    pub succeeded: usize,
    /// Pages still missing an image when the run finished
    pub failed: usize,
    /// Retry rounds actually used (0 when the first pass finished the job)
    pub rounds_used: u32,
    /// Whether the run stopped because its wall-clock budget expired
    pub budget_exhausted: bool,
    /// Human-readable summary persisted for user display on failure
    pub failure_summary: Option<String>,
}

impl IllustrationReport {
    /// Fraction of pages that ended up with an image, in `[0.0, 1.0]`.
    pub fn success_rate(&self) -> f64 {
        if self.total_pages == 0 {
            1.0
        } else {
            self.succeeded as f64 / self.total_pages as f64
        }
    }
}
