//! Configuration loading for Parley.
//!
//! Reads `config.toml` from the data directory (`~/.parley/` in production)
//! and deserializes it into [`BotConfig`]. Falls back to defaults when the
//! file is missing or malformed. Secrets never live in the file; they are
//! read from environment variables into [`Secrets`].

use std::path::{Path, PathBuf};

use parley_types::config::BotConfig;
use secrecy::SecretString;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "PARLEY_DATA_DIR";
/// Environment variable holding the AI backend API key.
pub const AI_API_KEY_ENV: &str = "PARLEY_AI_API_KEY";
/// Environment variable holding the shared secret expected from the chat gateway.
pub const GATEWAY_TOKEN_ENV: &str = "PARLEY_GATEWAY_TOKEN";

/// Resolve the data directory.
///
/// Priority:
/// 1. `PARLEY_DATA_DIR` environment variable
/// 2. `~/.parley`
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".parley");
    }

    PathBuf::from(".parley")
}

/// Load bot configuration from `{data_dir}/config.toml`.
///
/// - Missing file: returns [`BotConfig::default()`].
/// - Unreadable or unparsable file: logs a warning and returns the default.
pub async fn load_bot_config(data_dir: &Path) -> BotConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return BotConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return BotConfig::default();
        }
    };

    match toml::from_str::<BotConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            BotConfig::default()
        }
    }
}

/// Credentials sourced from the environment.
#[derive(Default)]
pub struct Secrets {
    /// Bearer key for the AI backend.
    pub ai_api_key: Option<SecretString>,
    /// Token the chat gateway must send in `X-Gateway-Token`. Unset disables the check.
    pub gateway_token: Option<SecretString>,
}

impl Secrets {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build secrets from an arbitrary variable lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .map(SecretString::from)
        };
        Self {
            ai_api_key: read(AI_API_KEY_ENV),
            gateway_token: read(GATEWAY_TOKEN_ENV),
        }
    }
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("ai_api_key", &self.ai_api_key.as_ref().map(|_| "[REDACTED]"))
            .field("gateway_token", &self.gateway_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::time::Duration;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_bot_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_bot_config(tmp.path()).await;
        assert_eq!(config.conversation.prompt_delay(), Duration::from_secs(300));
        assert_eq!(config.rate_limit.max_messages, 20);
    }

    #[tokio::test]
    async fn load_bot_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join("config.toml"),
            r#"
[conversation]
prompt_delay_secs = 120
end_commands = ["/done"]

[rate_limit]
max_messages = 5

[ai]
base_url = "http://localhost:5001/v1"
"#,
        )
        .await
        .unwrap();

        let config = load_bot_config(tmp.path()).await;
        assert_eq!(config.conversation.prompt_delay_secs, 120);
        assert_eq!(config.conversation.expiry_timeout_secs, 300);
        assert!(config.conversation.is_end_command("/DONE"));
        assert_eq!(config.rate_limit.max_messages, 5);
        assert_eq!(config.ai.base_url, "http://localhost:5001/v1");
        assert_eq!(config.transport.gateway_url, "http://127.0.0.1:8080");
    }

    #[tokio::test]
    async fn load_bot_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "not { valid toml !!!")
            .await
            .unwrap();

        let config = load_bot_config(tmp.path()).await;
        assert_eq!(config.conversation.expiry_timeout_secs, 300);
    }

    #[test]
    fn secrets_ignore_blank_values() {
        let secrets = Secrets::from_lookup(|name| match name {
            AI_API_KEY_ENV => Some(" app-123 ".to_string()),
            GATEWAY_TOKEN_ENV => Some("   ".to_string()),
            _ => None,
        });
        assert_eq!(secrets.ai_api_key.unwrap().expose_secret(), "app-123");
        assert!(secrets.gateway_token.is_none());
    }

    #[test]
    fn secrets_debug_is_redacted() {
        let secrets = Secrets::from_lookup(|_| Some("hunter2".to_string()));
        let debug = format!("{secrets:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn resolve_data_dir_from_env() {
        // SAFETY: no other test in this crate reads PARLEY_DATA_DIR.
        unsafe {
            std::env::set_var(DATA_DIR_ENV, "/tmp/test-parley");
        }
        let dir = resolve_data_dir();
        assert_eq!(dir, PathBuf::from("/tmp/test-parley"));
        unsafe {
            std::env::remove_var(DATA_DIR_ENV);
        }
    }
}
