//! Layered TOML configuration for the Aesop pipeline.
//!
//! Configuration is loaded with the `config` crate from three sources, later
//! sources overriding earlier ones:
//! 1. Bundled defaults (`include_str!` from `aesop.toml`)
//! 2. User config in the home directory (`~/.config/aesop/aesop.toml`)
//! 3. User config in the current directory (`./aesop.toml`)
//!
//! Every component receives its configuration section explicitly at
//! construction time; nothing in the pipeline reads process-wide environment
//! variables. The CLI layer is the only place ambient values (API keys,
//! database URLs) are resolved and injected.

use crate::{ImageQuality, ImageSize};
use aesop_error::{AesopError, AesopResult, ConfigError};
use config::{Config, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

/// Image-generation API client configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ImageApiConfig {
    /// API key; resolved by the caller, never read from the environment here
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL of the API, e.g. `https://api.openai.com/v1`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model identifier sent with each request
    #[serde(default = "default_image_model")]
    pub model: String,

    /// Default output resolution
    #[serde(default)]
    pub size: ImageSize,

    /// Default quality tier
    #[serde(default)]
    pub quality: ImageQuality,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub timeout_secs: u64,

    /// Request throttle in images per minute; `None` disables throttling
    #[serde(default)]
    pub images_per_minute: Option<u32>,
}

impl ImageApiConfig {
    /// Replace the API key, consuming self.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Per-request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ImageApiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model: default_image_model(),
            size: ImageSize::default(),
            quality: ImageQuality::default(),
            timeout_secs: default_request_timeout_secs(),
            images_per_minute: None,
        }
    }
}

/// Illustration orchestrator configuration.
///
/// # Examples
///
/// ```
/// use aesop_core::IllustratorConfig;
///
/// let config = IllustratorConfig::default();
/// assert_eq!(config.retry_rounds, 5);
/// assert_eq!(config.stagger().as_secs(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct IllustratorConfig {
    /// Start delay between page requests in milliseconds, multiplied by the
    /// page index to bound the burst rate against the upstream API
    #[serde(default = "default_stagger_ms")]
    pub stagger_ms: u64,

    /// Maximum number of retry rounds after the initial pass
    #[serde(default = "default_retry_rounds")]
    pub retry_rounds: u32,

    /// Base backoff in milliseconds; round `n` waits `2^n` times this
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Flat extra delay in milliseconds added on rounds after the first to
    /// further relieve rate limiting
    #[serde(default = "default_extra_round_delay_ms")]
    pub extra_round_delay_ms: u64,

    /// Retry round from which prompts use the conservative safety tier
    #[serde(default = "default_conservative_from_round")]
    pub conservative_from_round: u32,

    /// Attempts for each page-row update on transient database failure
    #[serde(default = "default_db_update_retries")]
    pub db_update_retries: usize,

    /// Overall wall-clock budget for one orchestration run in seconds;
    /// `None` disables the deadline
    #[serde(default = "default_run_budget_secs")]
    pub run_budget_secs: Option<u64>,
}

impl IllustratorConfig {
    /// Stagger step as a [`Duration`].
    pub fn stagger(&self) -> Duration {
        Duration::from_millis(self.stagger_ms)
    }

    /// Base backoff as a [`Duration`].
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    /// Flat extra round delay as a [`Duration`].
    pub fn extra_round_delay(&self) -> Duration {
        Duration::from_millis(self.extra_round_delay_ms)
    }

    /// Run budget as a [`Duration`], if configured.
    pub fn run_budget(&self) -> Option<Duration> {
        self.run_budget_secs.map(Duration::from_secs)
    }

    /// Validate field ranges.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first out-of-range field.
    pub fn validate(&self) -> Result<(), String> {
        if self.retry_rounds > 10 {
            return Err(format!(
                "retry_rounds must be at most 10, got {}",
                self.retry_rounds
            ));
        }
        if self.conservative_from_round == 0 {
            return Err("conservative_from_round must be at least 1".to_string());
        }
        if self.db_update_retries == 0 {
            return Err("db_update_retries must be at least 1".to_string());
        }
        Ok(())
    }
}

impl Default for IllustratorConfig {
    fn default() -> Self {
        Self {
            stagger_ms: default_stagger_ms(),
            retry_rounds: default_retry_rounds(),
            base_delay_ms: default_base_delay_ms(),
            extra_round_delay_ms: default_extra_round_delay_ms(),
            conservative_from_round: default_conservative_from_round(),
            db_update_retries: default_db_update_retries(),
            run_budget_secs: default_run_budget_secs(),
        }
    }
}

/// Document assembler configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DocumentConfig {
    /// Maximum number of story pages rendered into one document
    #[serde(default = "default_max_story_pages")]
    pub max_story_pages: usize,

    /// Timeout for fetching a remote illustration in milliseconds
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,

    /// Byte ceiling for any single illustration payload
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: usize,
}

impl DocumentConfig {
    /// Remote fetch timeout as a [`Duration`].
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    /// Validate field ranges.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first out-of-range field.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_story_pages == 0 {
            return Err("max_story_pages must be at least 1".to_string());
        }
        if self.max_image_bytes == 0 {
            return Err("max_image_bytes must be at least 1".to_string());
        }
        Ok(())
    }
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            max_story_pages: default_max_story_pages(),
            fetch_timeout_ms: default_fetch_timeout_ms(),
            max_image_bytes: default_max_image_bytes(),
        }
    }
}

/// Object storage configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Root directory for the filesystem store
    #[serde(default = "default_storage_root")]
    pub root: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
        }
    }
}

/// Relational store configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
pub struct DatabaseConfig {
    /// Postgres connection URL; resolved by the caller when unset
    #[serde(default)]
    pub url: Option<String>,
}

/// Top-level Aesop configuration.
///
/// # Example
///
/// ```no_run
/// use aesop_core::AesopConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = AesopConfig::load()?;
/// println!("image model: {}", config.image.model);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
pub struct AesopConfig {
    /// Image-generation API section
    #[serde(default)]
    pub image: ImageApiConfig,

    /// Orchestrator section
    #[serde(default)]
    pub illustrator: IllustratorConfig,

    /// Document assembler section
    #[serde(default)]
    pub document: DocumentConfig,

    /// Object storage section
    #[serde(default)]
    pub storage: StorageConfig,

    /// Database section
    #[serde(default)]
    pub database: DatabaseConfig,
}

impl AesopConfig {
    /// Load configuration from a specific file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<std::path::Path>) -> AesopResult<Self> {
        debug!("Loading configuration from file");

        let config: AesopConfig = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .map_err(|e| {
                AesopError::from(ConfigError::new(format!(
                    "Failed to read configuration from {}: {}",
                    path.as_ref().display(),
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                AesopError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration with precedence: user override > bundled default.
    ///
    /// Configuration sources in order of precedence (later sources override
    /// earlier):
    /// 1. Bundled defaults (aesop.toml shipped with the library)
    /// 2. User config in home directory (`~/.config/aesop/aesop.toml`)
    /// 3. User config in current directory (`./aesop.toml`)
    ///
    /// User config files are optional and silently skipped if not found.
    #[instrument]
    pub fn load() -> AesopResult<Self> {
        debug!("Loading configuration with precedence: current dir > home dir > bundled defaults");

        // Bundled default configuration
        const DEFAULT_CONFIG: &str = include_str!("../aesop.toml");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        // Add user config from home directory (optional)
        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/aesop/aesop.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        // Add user config from current directory (optional, highest precedence)
        builder = builder.add_source(File::with_name("aesop").required(false));

        let config: AesopConfig = builder
            .build()
            .map_err(|e| {
                AesopError::from(ConfigError::new(format!(
                    "Failed to build configuration: {}",
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                AesopError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate every section.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` naming the offending section and field.
    pub fn validate(&self) -> AesopResult<()> {
        self.illustrator
            .validate()
            .map_err(|e| AesopError::from(ConfigError::new(format!("illustrator: {}", e))))?;
        self.document
            .validate()
            .map_err(|e| AesopError::from(ConfigError::new(format!("document: {}", e))))?;
        Ok(())
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_image_model() -> String {
    "dall-e-3".to_string()
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_stagger_ms() -> u64 {
    2_000
}

fn default_retry_rounds() -> u32 {
    5
}

fn default_base_delay_ms() -> u64 {
    2_000
}

fn default_extra_round_delay_ms() -> u64 {
    5_000
}

fn default_conservative_from_round() -> u32 {
    2
}

fn default_db_update_retries() -> usize {
    3
}

fn default_run_budget_secs() -> Option<u64> {
    Some(600)
}

fn default_max_story_pages() -> usize {
    8
}

fn default_fetch_timeout_ms() -> u64 {
    2_000
}

fn default_max_image_bytes() -> usize {
    2 * 1024 * 1024
}

fn default_storage_root() -> String {
    "./media".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AesopConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.illustrator.retry_rounds, 5);
        assert_eq!(config.document.max_story_pages, 8);
    }

    #[test]
    fn bundled_defaults_parse() {
        let parsed: AesopConfig = Config::builder()
            .add_source(File::from_str(
                include_str!("../aesop.toml"),
                FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert!(parsed.validate().is_ok());
        assert_eq!(parsed.image.model, "dall-e-3");
    }

    #[test]
    fn out_of_range_rounds_rejected() {
        let config = IllustratorConfig {
            retry_rounds: 50,
            ..IllustratorConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
