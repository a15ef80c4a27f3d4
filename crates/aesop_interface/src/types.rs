//! Shared types for capability contracts.

use serde::{Deserialize, Serialize};

/// Reference to an object written to durable storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoredObject {
    /// The hierarchical key the object was written under
    pub key: String,
    /// Public or backend-specific URL for direct access
    pub url: String,
    /// SHA-256 hash of the content, hex encoded
    pub sha256: String,
    /// Size of the object in bytes
    pub size_bytes: i64,
}

/// Classification of a failed image-generation attempt.
///
/// Drives the orchestrator's retry behavior: rate limits wait longer,
/// content-policy rejections switch to a safer prompt, everything else
/// retries with the standard backoff.
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
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FailureKind {
    /// The provider returned HTTP 429
    RateLimit,
    /// The provider rejected the prompt on content-policy grounds
    ContentPolicy,
    /// Any other generation failure, including timeouts and decode errors
    GenerationFailed,
}
