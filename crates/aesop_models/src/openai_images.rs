//! OpenAI-style image-generation client.
//!
//! Speaks JSON-over-HTTPS to a `/images/generations` endpoint and maps the
//! provider's failure modes onto [`ImageGenErrorKind`] so the orchestrator
//! can distinguish rate limiting (longer waits) from content-policy
//! rejections (safer prompt on retry).

use aesop_core::{GeneratedImage, ImageApiConfig, ImageRequest};
use aesop_error::{AesopError, AesopResult, ImageGenError, ImageGenErrorKind, RetryableError};
use aesop_interface::ImageGenerator;
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::time::Duration;
use tokio_retry2::strategy::{ExponentialBackoff, jitter};
use tokio_retry2::{Retry, RetryError};
use tracing::{instrument, warn};

#[derive(Debug, Serialize)]
struct ImagesRequestBody<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u8,
    size: &'a str,
    quality: &'a str,
    response_format: &'a str,
}

#[derive(Debug, Deserialize)]
struct ImagesResponseBody {
    data: Vec<ImageDatum>,
}

#[derive(Debug, Deserialize)]
struct ImageDatum {
    b64_json: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    code: Option<String>,
    message: Option<String>,
}

/// Client for an OpenAI-style image-generation API.
///
/// Configuration is explicit: the API key, base URL, model, and throttle all
/// arrive via [`ImageApiConfig`], never from the process environment, so
/// tests can substitute fake endpoints deterministically.
pub struct OpenAiImageClient {
    http: reqwest::Client,
    config: ImageApiConfig,
    limiter: Option<DefaultDirectRateLimiter>,
}

impl std::fmt::Debug for OpenAiImageClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiImageClient")
            .field("base_url", &self.config.base_url)
            .field("model", &self.config.model)
            .field("throttled", &self.limiter.is_some())
            .finish_non_exhaustive()
    }
}

impl OpenAiImageClient {
    /// Create a new client from explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns `ImageGenErrorKind::MissingApiKey` when no key is configured,
    /// or a transport error if the HTTP client cannot be constructed.
    #[instrument(skip(config), fields(model = %config.model))]
    pub fn new(config: ImageApiConfig) -> AesopResult<Self> {
        if config.api_key.is_none() {
            return Err(ImageGenError::new(ImageGenErrorKind::MissingApiKey).into());
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ImageGenError::new(ImageGenErrorKind::Transport(e.to_string())))?;

        let limiter = config
            .images_per_minute
            .and_then(NonZeroU32::new)
            .map(|per_minute| RateLimiter::direct(Quota::per_minute(per_minute)));

        Ok(Self {
            http,
            config,
            limiter,
        })
    }

    /// One request/response cycle, with failure classification.
    async fn attempt(&self, req: &ImageRequest) -> Result<GeneratedImage, ImageGenError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| ImageGenError::new(ImageGenErrorKind::MissingApiKey))?;

        let url = format!(
            "{}/images/generations",
            self.config.base_url.trim_end_matches('/')
        );

        let size = req.size.unwrap_or(self.config.size);
        let quality = req.quality.unwrap_or(self.config.quality);
        let body = ImagesRequestBody {
            model: &self.config.model,
            prompt: &req.prompt,
            n: 1,
            size: size.as_str(),
            quality: quality.as_str(),
            response_format: "b64_json",
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ImageGenError::new(ImageGenErrorKind::Timeout(e.to_string()))
                } else {
                    ImageGenError::new(ImageGenErrorKind::Transport(e.to_string()))
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let text = response.text().await.unwrap_or_default();
            return Err(ImageGenError::new(ImageGenErrorKind::RateLimited(
                truncate(&text),
            )));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            if is_content_policy_body(&text) {
                return Err(ImageGenError::new(ImageGenErrorKind::ContentPolicy(
                    truncate(&text),
                )));
            }
            return Err(ImageGenError::new(ImageGenErrorKind::HttpError {
                status_code: status.as_u16(),
                message: truncate(&text),
            }));
        }

        let body: ImagesResponseBody = response.json().await.map_err(|e| {
            ImageGenError::new(ImageGenErrorKind::InvalidResponse(e.to_string()))
        })?;

        let first = body
            .data
            .into_iter()
            .next()
            .ok_or_else(|| ImageGenError::new(ImageGenErrorKind::EmptyResponse))?;
        let b64_json = first
            .b64_json
            .ok_or_else(|| ImageGenError::new(ImageGenErrorKind::EmptyResponse))?;

        Ok(GeneratedImage {
            b64_json,
            mime: "image/png".to_string(),
        })
    }
}

#[async_trait]
impl ImageGenerator for OpenAiImageClient {
    #[instrument(skip(self, req), fields(model = %self.config.model, prompt_len = req.prompt.len()))]
    async fn generate(&self, req: &ImageRequest) -> AesopResult<GeneratedImage> {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }

        // Probe once to get an error-specific strategy; 429 and
        // content-policy rejections surface immediately so the orchestrator
        // owns their retry semantics.
        match self.attempt(req).await {
            Ok(image) => Ok(image),
            Err(e) if !is_transport_retryable(&e) => Err(e.into()),
            Err(e) => {
                let (initial_ms, max_retries, max_delay_secs) = e.retry_strategy_params();
                warn!(
                    error = %e,
                    initial_backoff_ms = initial_ms,
                    max_retries,
                    "Image API transport failure, retrying with backoff"
                );

                let retry_strategy = ExponentialBackoff::from_millis(initial_ms)
                    .factor(2)
                    .max_delay(Duration::from_secs(max_delay_secs))
                    .map(jitter)
                    .take(max_retries);

                Retry::spawn(retry_strategy, || async {
                    match self.attempt(req).await {
                        Ok(image) => Ok(image),
                        Err(e) if is_transport_retryable(&e) => {
                            warn!(error = %e, "Image API transport failure, will retry");
                            Err(RetryError::Transient {
                                err: e,
                                retry_after: None,
                            })
                        }
                        Err(e) => Err(RetryError::Permanent(e)),
                    }
                })
                .await
                .map_err(AesopError::from)
            }
        }
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

/// Transport-level failures the client absorbs itself. Rate limits and
/// content-policy rejections are excluded: the orchestrator reacts to those
/// with staggered rounds and safer prompts.
fn is_transport_retryable(err: &ImageGenError) -> bool {
    matches!(
        err.kind,
        ImageGenErrorKind::Transport(_)
            | ImageGenErrorKind::Timeout(_)
            | ImageGenErrorKind::HttpError {
                status_code: 500 | 502 | 503 | 504,
                ..
            }
    )
}

/// Detect a content-policy rejection in an error response body.
fn is_content_policy_body(body: &str) -> bool {
    if let Ok(parsed) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(detail) = parsed.error {
            if detail
                .code
                .as_deref()
                .is_some_and(|code| code.contains("content_policy"))
            {
                return true;
            }
            if detail
                .message
                .as_deref()
                .is_some_and(|msg| msg.to_lowercase().contains("safety system"))
            {
                return true;
            }
        }
    }
    let lowered = body.to_lowercase();
    lowered.contains("content_policy") || lowered.contains("safety system")
}

fn truncate(text: &str) -> String {
    const MAX: usize = 400;
    if text.len() <= MAX {
        text.to_string()
    } else {
        let mut end = MAX;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &text[..end])
    }
}
