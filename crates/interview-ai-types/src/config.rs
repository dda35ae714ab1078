//! Configuration types for the generation core.
//!
//! `AiConfig` represents the top-level `config.toml`. Every field has a
//! default, so an empty file (or no file) yields a working configuration.
//! API keys are never read from here; they come from the environment.

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default)]
    pub openrouter: OpenRouterSettings,

    #[serde(default)]
    pub openai: OpenAiSettings,

    #[serde(default)]
    pub key_pool: KeyPoolConfig,

    #[serde(default)]
    pub router: RouterConfig,

    #[serde(default)]
    pub operators: OperatorConfig,
}

/// Primary (aggregator) provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenRouterSettings {
    #[serde(default = "default_openrouter_base_url")]
    pub base_url: String,
    #[serde(default = "default_openrouter_model")]
    pub default_model: String,
    /// Sent as `HTTP-Referer`.
    #[serde(default = "default_referer")]
    pub referer: String,
    /// Sent as `X-Title`.
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_openrouter_base_url() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_openrouter_model() -> String {
    "openai/gpt-4o-mini".to_string()
}

fn default_referer() -> String {
    "https://interview-ai.app".to_string()
}

fn default_title() -> String {
    "Interview AI".to_string()
}

fn default_request_timeout_secs() -> u64 {
    60
}

impl Default for OpenRouterSettings {
    fn default() -> Self {
        Self {
            base_url: default_openrouter_base_url(),
            default_model: default_openrouter_model(),
            referer: default_referer(),
            title: default_title(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Secondary (direct) provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiSettings {
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
    #[serde(default = "default_openai_model")]
    pub default_model: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

impl Default for OpenAiSettings {
    fn default() -> Self {
        Self {
            base_url: default_openai_base_url(),
            default_model: default_openai_model(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Key rotation and cooldown policy.
///
/// The 429 check and the consecutive-failure threshold are independent
/// knobs; setting `failure_threshold` to 0 disables the count-based rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyPoolConfig {
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    /// Substrings of an error message that mark it as a quota error.
    #[serde(default = "default_quota_markers")]
    pub quota_markers: Vec<String>,
}

fn default_cooldown_secs() -> u64 {
    3600
}

fn default_failure_threshold() -> u32 {
    3
}

fn default_quota_markers() -> Vec<String> {
    vec![
        "insufficient_quota".to_string(),
        "quota_exceeded".to_string(),
        "rate_limit".to_string(),
    ]
}

impl Default for KeyPoolConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: default_cooldown_secs(),
            failure_threshold: default_failure_threshold(),
            quota_markers: default_quota_markers(),
        }
    }
}

/// Two-stage routing policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    #[serde(default = "default_max_primary_attempts")]
    pub max_primary_attempts: u32,
    /// Secondary-provider calls a non-premium user may make per UTC day.
    #[serde(default = "default_daily_secondary_limit")]
    pub daily_secondary_limit: u32,
    /// Deadline over both stages. `None` leaves only the per-call timeout.
    #[serde(default)]
    pub overall_timeout_secs: Option<u64>,
}

fn default_max_primary_attempts() -> u32 {
    3
}

fn default_daily_secondary_limit() -> u32 {
    10
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            max_primary_attempts: default_max_primary_attempts(),
            daily_secondary_limit: default_daily_secondary_limit(),
            overall_timeout_secs: None,
        }
    }
}

/// Bearer tokens accepted by the operator surface, stored as lowercase
/// SHA-256 hex digests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperatorConfig {
    /// The owner may see full key secrets in the status snapshot.
    #[serde(default)]
    pub owner_token_sha256: Option<String>,
    #[serde(default)]
    pub admin_token_sha256: Vec<String>,
    /// Backends allowed to call the generation endpoint. They vouch for the
    /// `user_id` and premium flag they send.
    #[serde(default)]
    pub caller_token_sha256: Vec<String>,
}
