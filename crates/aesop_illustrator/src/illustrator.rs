//! The illustration orchestrator.

use crate::{IllustrationReport, RunBudget};
use aesop_core::{
    AttemptStatus, CharacterSheet, GenerationKind, IllustratorConfig, ImageRequest, ImageSource,
    Story, StoryPage, StoryStatus,
};
use aesop_error::{
    AesopError, AesopErrorKind, AesopResult, ImageGenErrorKind, PipelineError, PipelineErrorKind,
};
use aesop_interface::{FailureKind, ImageGenerator, MediaStore, StoryStore};
use aesop_prompt::{SafetyTier, illustration_prompt};
use futures::future::join_all;
use std::time::Duration;
use tokio_retry2::strategy::FixedInterval;
use tokio_retry2::{Retry, RetryError};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// Classify a failed page generation for logging and retry tuning.
///
/// HTTP 429 maps to [`FailureKind::RateLimit`], a content-policy rejection
/// to [`FailureKind::ContentPolicy`], anything else to
/// [`FailureKind::GenerationFailed`].
pub fn classify_failure(err: &AesopError) -> FailureKind {
    match err.kind() {
        AesopErrorKind::ImageGen(e) => match &e.kind {
            ImageGenErrorKind::RateLimited(_) => FailureKind::RateLimit,
            ImageGenErrorKind::HttpError {
                status_code: 429, ..
            } => FailureKind::RateLimit,
            ImageGenErrorKind::ContentPolicy(_) => FailureKind::ContentPolicy,
            _ => FailureKind::GenerationFailed,
        },
        _ => FailureKind::GenerationFailed,
    }
}

/// Produces one persisted illustration per story page, tolerating partial
/// failure.
///
/// All collaborators arrive as capabilities so tests can substitute fakes;
/// configuration is explicit via [`IllustratorConfig`].
///
/// The run shape:
/// 1. Load story, pages, and the optional character sheet (the only fatal
///    failures).
/// 2. Transition the story to `generating` and record a generation attempt.
/// 3. First pass over every page still missing an image: staggered fan-out,
///    fan-in, per-page failures logged and absorbed.
/// 4. Up to `retry_rounds` rounds over the still-missing pages, with
///    exponential backoff plus a flat extra delay from round 2, and
///    conservative prompts from `conservative_from_round`.
/// 5. Final status decision: `completed` only when no page is missing an
///    image; otherwise `failed` with a persisted human-readable summary.
pub struct Illustrator<G, S, R> {
    generator: G,
    store: S,
    repo: R,
    config: IllustratorConfig,
}

impl<G, S, R> Illustrator<G, S, R>
where
    G: ImageGenerator,
    S: MediaStore,
    R: StoryStore,
{
    /// Create an orchestrator from its collaborators and configuration.
    pub fn new(generator: G, store: S, repo: R, config: IllustratorConfig) -> Self {
        Self {
            generator,
            store,
            repo,
            config,
        }
    }

    /// Access the underlying image generator.
    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Run one orchestration pass for `story_id`.
    ///
    /// # Errors
    ///
    /// Only precondition failures are fatal: the story, its pages, or its
    /// character sheet cannot be loaded, the story is already generating, or
    /// run bookkeeping cannot be persisted. Per-page generation failures are
    /// absorbed into the final report instead.
    #[instrument(skip(self), fields(story_id = %story_id))]
    pub async fn run(&self, story_id: Uuid) -> AesopResult<IllustrationReport> {
        let story = self.repo.load_story(story_id).await?;
        let pages = self.repo.list_pages(story_id).await?;
        if pages.is_empty() {
            return Err(PipelineError::new(PipelineErrorKind::NoPages(
                story_id.to_string(),
            ))
            .into());
        }

        let character = match story.character_sheet_id {
            Some(character_id) => Some(self.repo.load_character(character_id).await?),
            None => None,
        };

        let next = story.status.transition(StoryStatus::Generating)?;
        self.repo.update_story_status(story_id, next, None).await?;
        let attempt_id = self
            .repo
            .begin_attempt(story_id, GenerationKind::Illustrations)
            .await?;

        info!(
            pages = pages.len(),
            art_style = %story.art_style,
            has_character = character.is_some(),
            "Starting illustration run"
        );

        match self
            .run_rounds(&story, &pages, character.as_ref())
            .await
        {
            Ok(report) => {
                let summary = report.failure_summary.as_deref();
                self.repo
                    .update_story_status(story_id, report.status, summary)
                    .await?;
                let attempt_status = if report.status == StoryStatus::Completed {
                    AttemptStatus::Completed
                } else {
                    AttemptStatus::Failed
                };
                self.repo
                    .finish_attempt(attempt_id, attempt_status, summary)
                    .await?;

                info!(
                    status = %report.status,
                    succeeded = report.succeeded,
                    failed = report.failed,
                    rounds_used = report.rounds_used,
                    "Illustration run finished"
                );
                Ok(report)
            }
            Err(e) => {
                // Mid-run bookkeeping failure. Record the abort best-effort;
                // the original error is the one worth surfacing.
                error!(error = %e, "Illustration run aborted");
                let message = format!("illustration run aborted: {}", e);
                if let Err(status_err) = self
                    .repo
                    .update_story_status(story_id, StoryStatus::Failed, Some(&message))
                    .await
                {
                    warn!(error = %status_err, "Failed to record aborted story status");
                }
                if let Err(attempt_err) = self
                    .repo
                    .finish_attempt(attempt_id, AttemptStatus::Failed, Some(&message))
                    .await
                {
                    warn!(error = %attempt_err, "Failed to record aborted attempt");
                }
                Err(e)
            }
        }
    }

    async fn run_rounds(
        &self,
        story: &Story,
        pages: &[StoryPage],
        character: Option<&CharacterSheet>,
    ) -> AesopResult<IllustrationReport> {
        let total = pages.len();
        let budget = RunBudget::new(self.config.run_budget());
        let mut rounds_used = 0;
        let mut budget_exhausted = false;

        // First pass covers only pages still missing an image, so a manual
        // retry of a failed story regenerates nothing that already succeeded.
        let pending: Vec<StoryPage> = pages.iter().filter(|p| p.missing_image()).cloned().collect();
        if !pending.is_empty() {
            self.illustrate_batch(story, &pending, character, 0, SafetyTier::Normal)
                .await;
        }

        for round in 1..=self.config.retry_rounds {
            let missing = self.repo.pages_missing_image(story.id).await?;
            if missing.is_empty() {
                break;
            }
            if budget.exhausted() {
                budget_exhausted = true;
                warn!(
                    elapsed_secs = budget.elapsed().as_secs(),
                    missing = missing.len(),
                    "Run budget exhausted, keeping partial results for a follow-up run"
                );
                break;
            }

            let delay = self.round_delay(round);
            let tier = if round >= self.config.conservative_from_round {
                SafetyTier::Conservative
            } else {
                SafetyTier::Normal
            };
            info!(
                round,
                missing = missing.len(),
                delay_ms = delay.as_millis() as u64,
                tier = %tier,
                "Starting retry round"
            );
            tokio::time::sleep(delay).await;

            rounds_used = round;
            self.illustrate_batch(story, &missing, character, round, tier)
                .await;
        }

        let missing = self.repo.pages_missing_image(story.id).await?;
        let failed = missing.len();
        let succeeded = total.saturating_sub(failed);

        let (status, failure_summary) = if failed == 0 {
            (StoryStatus::Completed, None)
        } else {
            let numbers: Vec<String> = missing
                .iter()
                .map(|p| p.page_number.to_string())
                .collect();
            let mut summary = format!(
                "{} of {} illustrations could not be generated (pages {})",
                failed,
                total,
                numbers.join(", ")
            );
            if budget_exhausted {
                summary.push_str("; run budget exhausted before retries finished");
            }
            (StoryStatus::Failed, Some(summary))
        };

        Ok(IllustrationReport {
            status,
            total_pages: total,
            succeeded,
            failed,
            rounds_used,
            budget_exhausted,
            failure_summary,
        })
    }

    /// Fan out one task per page with staggered start delays; fan in when
    /// every task resolves. Per-page failures never propagate to siblings.
    #[instrument(skip(self, story, pages, character), fields(story_id = %story.id, batch = pages.len(), round))]
    async fn illustrate_batch(
        &self,
        story: &Story,
        pages: &[StoryPage],
        character: Option<&CharacterSheet>,
        round: u32,
        tier: SafetyTier,
    ) {
        let tasks = pages.iter().enumerate().map(|(index, page)| {
            let stagger = self.config.stagger().saturating_mul(index as u32);
            async move {
                if !stagger.is_zero() {
                    tokio::time::sleep(stagger).await;
                }
                match self.illustrate_page(story, page, character, round, tier).await {
                    Ok(()) => {
                        debug!(page = page.page_number, "Illustration stored");
                        true
                    }
                    Err(e) => {
                        let failure = classify_failure(&e);
                        warn!(
                            page = page.page_number,
                            kind = %failure,
                            error = %e,
                            "Page illustration failed, batch continues"
                        );
                        false
                    }
                }
            }
        });

        let outcomes = join_all(tasks).await;
        let succeeded = outcomes.iter().filter(|ok| **ok).count();
        info!(
            round,
            succeeded,
            failed = outcomes.len() - succeeded,
            "Batch finished"
        );
    }

    /// Generate, store, and record one page's illustration.
    async fn illustrate_page(
        &self,
        story: &Story,
        page: &StoryPage,
        character: Option<&CharacterSheet>,
        round: u32,
        tier: SafetyTier,
    ) -> AesopResult<()> {
        let prompt = illustration_prompt(&page.content, character, &story.art_style, tier);
        let request = ImageRequest::new(prompt.clone());

        let image = self.generator.generate(&request).await?;
        let bytes = image.decode()?;

        let key = page_key(story.id, page.page_number, round);
        let stored = self.store.put(&key, &bytes, &image.mime).await?;

        let source = ImageSource::Stored(stored.key);
        self.persist_page_image(page.id, &source, &prompt).await
    }

    /// Update the page row, retrying a bounded number of times on transient
    /// database failure.
    async fn persist_page_image(
        &self,
        page_id: Uuid,
        source: &ImageSource,
        prompt: &str,
    ) -> AesopResult<()> {
        let strategy =
            FixedInterval::from_millis(200).take(self.config.db_update_retries.saturating_sub(1));

        Retry::spawn(strategy, || async {
            match self.repo.update_page_image(page_id, source, prompt).await {
                Ok(()) => Ok(()),
                Err(e) if e.is_transient() => {
                    warn!(error = %e, "Transient failure updating page row, will retry");
                    Err(RetryError::Transient {
                        err: e,
                        retry_after: None,
                    })
                }
                Err(e) => Err(RetryError::Permanent(e)),
            }
        })
        .await
    }

    /// Exponential backoff per round, plus a flat extra delay from the
    /// second retry round on to further relieve rate limiting.
    fn round_delay(&self, round: u32) -> Duration {
        let exponential = self
            .config
            .base_delay()
            .saturating_mul(2u32.saturating_pow(round));
        if round >= 2 {
            exponential.saturating_add(self.config.extra_round_delay())
        } else {
            exponential
        }
    }
}

/// Deterministic storage key scoped by story, page, and attempt so
/// concurrent writes never collide.
fn page_key(story_id: Uuid, page_number: i32, round: u32) -> String {
    let stamp = chrono::Utc::now().timestamp_millis();
    format!(
        "stories/{}/pages/page-{:02}-r{}-{}.png",
        story_id, page_number, round, stamp
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use aesop_error::ImageGenError;

    #[test]
    fn classify_rate_limit() {
        let err: AesopError =
            ImageGenError::new(ImageGenErrorKind::RateLimited("busy".to_string())).into();
        assert_eq!(classify_failure(&err), FailureKind::RateLimit);

        let err: AesopError = ImageGenError::new(ImageGenErrorKind::HttpError {
            status_code: 429,
            message: "too many".to_string(),
        })
        .into();
        assert_eq!(classify_failure(&err), FailureKind::RateLimit);
    }

    #[test]
    fn classify_content_policy() {
        let err: AesopError =
            ImageGenError::new(ImageGenErrorKind::ContentPolicy("no".to_string())).into();
        assert_eq!(classify_failure(&err), FailureKind::ContentPolicy);
    }

    #[test]
    fn classify_other_failures() {
        let err: AesopError =
            ImageGenError::new(ImageGenErrorKind::Timeout("deadline".to_string())).into();
        assert_eq!(classify_failure(&err), FailureKind::GenerationFailed);
    }

    #[test]
    fn page_keys_are_scoped_and_unique_per_attempt() {
        let story_id = Uuid::new_v4();
        let key = page_key(story_id, 3, 2);
        assert!(key.starts_with(&format!("stories/{}/pages/page-03-r2-", story_id)));
        assert!(key.ends_with(".png"));
    }
}
