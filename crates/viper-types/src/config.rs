//! Configuration types for Viper.
//!
//! `ViperConfig` represents the optional `config.toml` in the data directory.
//! Every field has a default, so an empty or missing file is valid.

use serde::{Deserialize, Serialize};

/// Default Gemini model for specification generation.
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

/// Default environment variable holding the generation API key.
pub const DEFAULT_API_KEY_ENV: &str = "API_KEY";

/// Default name of the durable fleet slot.
pub const DEFAULT_SLOT_NAME: &str = "viper_bots";

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViperConfig {
    /// Model identifier for the generation service.
    #[serde(default = "default_model")]
    pub model: String,

    /// Environment variable the API key is read from.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Override the generation service base URL (proxies, tests).
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    #[serde(default)]
    pub generation: GenerationPolicy,

    #[serde(default)]
    pub builder: BuilderSettings,

    #[serde(default)]
    pub storage: StorageSettings,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_api_key_env() -> String {
    DEFAULT_API_KEY_ENV.to_string()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_max_output_tokens() -> u32 {
    2048
}

impl Default for ViperConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_key_env: default_api_key_env(),
            base_url: None,
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
            generation: GenerationPolicy::default(),
            builder: BuilderSettings::default(),
            storage: StorageSettings::default(),
        }
    }
}

/// Timeout and retry policy for the outbound generation call.
///
/// TOML cannot express `None`, so `timeout_secs = 0` also disables the deadline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationPolicy {
    /// Per-attempt deadline in seconds. `None` waits indefinitely.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: Option<u64>,

    /// Total attempts, including the first. Values below 1 behave as 1.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base backoff between attempts; attempt `n` waits `n * retry_backoff_ms`.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

fn default_timeout_secs() -> Option<u64> {
    Some(60)
}

fn default_max_attempts() -> u32 {
    1
}

fn default_retry_backoff_ms() -> u64 {
    500
}

impl GenerationPolicy {
    /// Per-attempt deadline, if any.
    pub fn deadline(&self) -> Option<std::time::Duration> {
        self.timeout_secs
            .filter(|secs| *secs > 0)
            .map(std::time::Duration::from_secs)
    }

    /// Total attempts, never below one.
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

impl Default for GenerationPolicy {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_attempts: default_max_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

/// Builder session settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuilderSettings {
    /// Cosmetic pause before a finalized record is stored.
    #[serde(default = "default_finalize_delay_ms")]
    pub finalize_delay_ms: u64,
}

fn default_finalize_delay_ms() -> u64 {
    800
}

impl Default for BuilderSettings {
    fn default() -> Self {
        Self {
            finalize_delay_ms: default_finalize_delay_ms(),
        }
    }
}

/// Durable fleet slot settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageSettings {
    #[serde(default = "default_slot_name")]
    pub slot_name: String,

    /// Upper bound on the serialized fleet, in bytes.
    #[serde(default = "default_max_slot_bytes")]
    pub max_slot_bytes: usize,
}

fn default_slot_name() -> String {
    DEFAULT_SLOT_NAME.to_string()
}

fn default_max_slot_bytes() -> usize {
    5 * 1024 * 1024
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            slot_name: default_slot_name(),
            max_slot_bytes: default_max_slot_bytes(),
        }
    }
}
