//! Story status state machine.

use aesop_error::{PipelineError, PipelineErrorKind};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a story.
///
/// Statuses form an explicit state machine rather than free-form strings.
/// Legal transitions:
///
/// ```text
/// draft ──────► generating ──────► completed
///                  ▲    │
///                  │    ▼
///                  └── failed   (manual retry re-enters generating)
/// ```
///
/// # Examples
///
/// ```
/// use aesop_core::StoryStatus;
///
/// let status = StoryStatus::Draft;
/// assert!(status.can_transition(StoryStatus::Generating));
/// assert!(!status.can_transition(StoryStatus::Completed));
///
/// let next = status.transition(StoryStatus::Generating).unwrap();
/// assert_eq!(next, StoryStatus::Generating);
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StoryStatus {
    /// Created by the wizard, illustrations not yet requested
    Draft,
    /// An orchestration run is producing illustrations
    Generating,
    /// Every page has a persisted illustration
    Completed,
    /// At least one page is missing an illustration after retries
    Failed,
}

impl StoryStatus {
    /// Check whether a transition to `to` is legal from this status.
    pub fn can_transition(self, to: StoryStatus) -> bool {
        matches!(
            (self, to),
            (StoryStatus::Draft, StoryStatus::Generating)
                | (StoryStatus::Generating, StoryStatus::Completed)
                | (StoryStatus::Generating, StoryStatus::Failed)
                | (StoryStatus::Failed, StoryStatus::Generating)
        )
    }

    /// Transition to `to`, rejecting illegal state changes.
    ///
    /// # Errors
    ///
    /// Returns `PipelineErrorKind::InvalidTransition` when the state machine
    /// does not permit the change.
    pub fn transition(self, to: StoryStatus) -> Result<StoryStatus, PipelineError> {
        if self.can_transition(to) {
            Ok(to)
        } else {
            Err(PipelineError::new(PipelineErrorKind::InvalidTransition {
                from: self.to_string(),
                to: to.to_string(),
            }))
        }
    }
}
