//! LLM request/response types for the generation core.
//!
//! These types model the data shapes exchanged between callers, the
//! failover router and the chat-completion provider clients, plus the
//! key pool snapshot consumed by the operator surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sampling temperature used when the caller does not specify one.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Output token budget used when the caller does not specify one.
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// System prompt used when neither the caller nor the adapter supplies one.
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful AI assistant for interview preparation.";

/// Role of a message in an LLM conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "system" => Ok(MessageRole::System),
            "user" | "human" => Ok(MessageRole::User),
            "assistant" | "ai" => Ok(MessageRole::Assistant),
            other => Err(format!("invalid message role: '{other}'")),
        }
    }
}

/// A single message in an LLM conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Which chat-completion backend handled (or should handle) a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Multi-key aggregator, tried first.
    OpenRouter,
    /// Single-key direct access, quota-gated fallback.
    OpenAi,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::OpenRouter => write!(f, "openrouter"),
            ProviderKind::OpenAi => write!(f, "openai"),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openrouter" => Ok(ProviderKind::OpenRouter),
            "openai" => Ok(ProviderKind::OpenAi),
            other => Err(format!("invalid provider kind: '{other}'")),
        }
    }
}

/// Per-call generation options. Unset fields fall back to provider defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Passed through verbatim as the `response_format` payload field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_format: Option<serde_json::Value>,
}

impl GenerationOptions {
    pub fn temperature_or_default(&self) -> f32 {
        self.temperature.unwrap_or(DEFAULT_TEMPERATURE)
    }

    pub fn max_tokens_or_default(&self) -> u32 {
        self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS)
    }
}

/// Feature label recorded when the caller does not name one.
pub const DEFAULT_FEATURE_TYPE: &str = "general";

/// Who is asking and for what feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationMetadata {
    /// Absent for anonymous callers, which never get fallback access.
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub is_premium_user: bool,
    /// Calling feature (e.g. "qa_session", "mcq_test"), stored as the
    /// ledger record's request type.
    #[serde(default = "default_feature_type")]
    pub feature_type: String,
    #[serde(default)]
    pub system_prompt: Option<String>,
}

fn default_feature_type() -> String {
    DEFAULT_FEATURE_TYPE.to_string()
}

impl Default for GenerationMetadata {
    fn default() -> Self {
        Self {
            user_id: None,
            is_premium_user: false,
            feature_type: default_feature_type(),
            system_prompt: None,
        }
    }
}

impl GenerationMetadata {
    /// Metadata for a known user.
    pub fn for_user(user_id: impl Into<String>, is_premium_user: bool) -> Self {
        Self {
            user_id: Some(user_id.into()),
            is_premium_user,
            feature_type: default_feature_type(),
            system_prompt: None,
        }
    }

    pub fn with_feature(mut self, feature_type: impl Into<String>) -> Self {
        self.feature_type = feature_type.into();
        self
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    /// The system prompt to send, falling back to [`DEFAULT_SYSTEM_PROMPT`].
    pub fn system_prompt_or_default(&self) -> &str {
        self.system_prompt
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(DEFAULT_SYSTEM_PROMPT)
    }
}

/// Normalized request handed to a provider client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub options: GenerationOptions,
}

/// Result of one chat-completion call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletion {
    /// First choice's message content.
    pub content: String,
    /// Model the provider reports having used.
    pub model: String,
    #[serde(default)]
    pub total_tokens: Option<u32>,
}

/// Snapshot of one primary-provider key for operator dashboards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyStatus {
    /// Configuration slot the key was loaded from; the operator identifier.
    pub slot: String,
    /// Last four characters of the key, prefixed with an ellipsis.
    pub masked_key: String,
    /// Full secret. Only populated for the owner role.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_key: Option<String>,
    pub failure_count: u32,
    pub usage_count: u64,
    pub disabled_until: Option<DateTime<Utc>>,
    pub manually_disabled: bool,
    /// Whether `select_key` could return this key right now.
    pub available: bool,
}

/// Snapshot of the whole primary key pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyPoolStatus {
    pub total_keys: usize,
    pub available_keys: usize,
    pub keys: Vec<KeyStatus>,
}

impl KeyPoolStatus {
    /// Drop the full secrets, leaving only masked identifiers.
    pub fn redacted(mut self) -> Self {
        for key in &mut self.keys {
            key.full_key = None;
        }
        self
    }
}

/// Operator-facing status of the generation core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemStatus {
    pub primary: KeyPoolStatus,
    pub secondary_configured: bool,
    pub daily_secondary_limit: u32,
    pub max_primary_attempts: u32,
}

impl SystemStatus {
    pub fn redacted(mut self) -> Self {
        self.primary = self.primary.redacted();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_role_accepts_chain_aliases() {
        assert_eq!("human".parse::<MessageRole>().unwrap(), MessageRole::User);
        assert_eq!("AI".parse::<MessageRole>().unwrap(), MessageRole::Assistant);
        assert!("tool".parse::<MessageRole>().is_err());
    }

    #[test]
    fn test_provider_kind_serde() {
        let json = serde_json::to_string(&ProviderKind::OpenRouter).unwrap();
        assert_eq!(json, "\"openrouter\"");
        let parsed: ProviderKind = serde_json::from_str("\"openai\"").unwrap();
        assert_eq!(parsed, ProviderKind::OpenAi);
        assert_eq!(ProviderKind::OpenAi.to_string(), "openai");
    }

    #[test]
    fn test_generation_options_defaults() {
        let options = GenerationOptions::default();
        assert!((options.temperature_or_default() - 0.7).abs() < f32::EPSILON);
        assert_eq!(options.max_tokens_or_default(), 4096);
    }

    #[test]
    fn test_metadata_deserialize_defaults() {
        let meta: GenerationMetadata = serde_json::from_str("{}").unwrap();
        assert!(meta.user_id.is_none());
        assert!(!meta.is_premium_user);
        assert_eq!(meta.feature_type, "general");
        assert_eq!(meta.system_prompt_or_default(), DEFAULT_SYSTEM_PROMPT);
    }

    #[test]
    fn test_blank_system_prompt_uses_default() {
        let meta = GenerationMetadata::for_user("u1", false).with_system_prompt("   ");
        assert_eq!(meta.system_prompt_or_default(), DEFAULT_SYSTEM_PROMPT);
    }

    #[test]
    fn test_key_pool_status_redacted_hides_full_key() {
        let status = KeyPoolStatus {
            total_keys: 1,
            available_keys: 1,
            keys: vec![KeyStatus {
                slot: "OPENROUTER_API_KEY_1".to_string(),
                masked_key: "...abcd".to_string(),
                full_key: Some("sk-or-abcd".to_string()),
                failure_count: 0,
                usage_count: 0,
                disabled_until: None,
                manually_disabled: false,
                available: true,
            }],
        };
        let redacted = status.redacted();
        assert!(redacted.keys[0].full_key.is_none());
        let json = serde_json::to_string(&redacted).unwrap();
        assert!(!json.contains("full_key"));
        assert!(!json.contains("sk-or-abcd"));
    }
}
