//! Configuration loading for Interview AI.
//!
//! Reads `config.toml` from the data directory (`~/.interview-ai/` in
//! production) and deserializes it into [`AiConfig`]. Falls back to
//! defaults when the file is missing or malformed.

use std::path::{Path, PathBuf};

use interview_ai_types::config::AiConfig;

/// Environment variable that overrides the data directory.
pub const DATA_DIR_ENV: &str = "INTERVIEW_AI_DATA_DIR";

/// Resolve the data directory.
///
/// Priority: `INTERVIEW_AI_DATA_DIR`, then `~/.interview-ai`, then
/// `./.interview-ai` when no home directory is known.
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".interview-ai");
    }

    PathBuf::from(".interview-ai")
}

/// Load configuration from `{data_dir}/config.toml`.
///
/// - Missing file: [`AiConfig::default()`].
/// - Unreadable or unparsable file: logs a warning and returns the default.
pub async fn load_ai_config(data_dir: &Path) -> AiConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return AiConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return AiConfig::default();
        }
    };

    match toml::from_str::<AiConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            AiConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_ai_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_ai_config(tmp.path()).await;
        assert_eq!(config.router.daily_secondary_limit, 10);
        assert_eq!(config.key_pool.cooldown_secs, 3600);
    }

    #[tokio::test]
    async fn load_ai_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join("config.toml"),
            r#"
[router]
max_primary_attempts = 5
daily_secondary_limit = 3

[key_pool]
cooldown_secs = 600
quota_markers = ["insufficient_quota"]

[openai]
default_model = "gpt-4.1-mini"
"#,
        )
        .await
        .unwrap();

        let config = load_ai_config(tmp.path()).await;
        assert_eq!(config.router.max_primary_attempts, 5);
        assert_eq!(config.router.daily_secondary_limit, 3);
        assert_eq!(config.key_pool.cooldown_secs, 600);
        assert_eq!(config.key_pool.quota_markers, vec!["insufficient_quota".to_string()]);
        assert_eq!(config.openai.default_model, "gpt-4.1-mini");
        assert_eq!(config.openrouter.title, "Interview AI");
    }

    #[tokio::test]
    async fn load_ai_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = load_ai_config(tmp.path()).await;
        assert_eq!(config.router.max_primary_attempts, 3);
    }

    #[test]
    fn resolve_data_dir_from_env() {
        // SAFETY: no other test in this crate reads or writes this variable.
        unsafe {
            std::env::set_var(DATA_DIR_ENV, "/tmp/test-interview-ai");
        }
        let dir = resolve_data_dir();
        assert_eq!(dir, PathBuf::from("/tmp/test-interview-ai"));
        unsafe {
            std::env::remove_var(DATA_DIR_ENV);
        }
    }
}
