//! Provider API keys from the environment.
//!
//! Keys are read once at start-up and never from `config.toml`.
//!
//! Primary (OpenRouter) slots, in pool order:
//! `OPENROUTER_API_KEY_1` .. `OPENROUTER_API_KEY_5`, then `OPENROUTER_API_KEY`.
//! Secondary (OpenAI): `OPENAI_API_KEY`.

use secrecy::SecretString;

/// Numbered primary slots followed by the generic one.
pub const PRIMARY_KEY_SLOTS: [&str; 6] = [
    "OPENROUTER_API_KEY_1",
    "OPENROUTER_API_KEY_2",
    "OPENROUTER_API_KEY_3",
    "OPENROUTER_API_KEY_4",
    "OPENROUTER_API_KEY_5",
    "OPENROUTER_API_KEY",
];

pub const SECONDARY_KEY_VAR: &str = "OPENAI_API_KEY";

/// Primary keys from the process environment.
pub fn primary_keys_from_env() -> Vec<(String, SecretString)> {
    primary_keys_from(env_value)
}

/// Secondary key from the process environment.
pub fn secondary_key_from_env() -> Option<SecretString> {
    env_value(SECONDARY_KEY_VAR).map(SecretString::from)
}

/// Collect `(slot, key)` pairs using `lookup` to read each slot.
///
/// Empty slots are skipped. Duplicate values are kept here; the key pool
/// drops them so only the first slot holding a value is used.
pub fn primary_keys_from(lookup: impl Fn(&str) -> Option<String>) -> Vec<(String, SecretString)> {
    let keys: Vec<(String, SecretString)> = PRIMARY_KEY_SLOTS
        .iter()
        .filter_map(|slot| {
            lookup(slot)
                .filter(|value| !value.trim().is_empty())
                .map(|value| (slot.to_string(), SecretString::from(value.trim().to_string())))
        })
        .collect();

    if keys.is_empty() {
        tracing::warn!("No OpenRouter API keys configured; primary provider disabled");
    } else {
        tracing::debug!(slots = keys.len(), "Loaded OpenRouter key slots");
    }
    keys
}

fn env_value(name: &str) -> Option<String> {
    // Non-Unicode values are treated as unset.
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
