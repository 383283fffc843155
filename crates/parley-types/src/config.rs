//! Bot configuration types for Parley.
//!
//! `BotConfig` represents the top-level `config.toml` that controls
//! conversation timing, rate limits, and the AI/transport endpoints.
//! Secrets are never stored here; they come from the environment.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::feedback::Rating;

/// Top-level configuration for the Parley bot.
///
/// Loaded from `~/.parley/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BotConfig {
    #[serde(default)]
    pub conversation: ConversationConfig,

    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    #[serde(default)]
    pub ai: AiConfig,

    #[serde(default)]
    pub transport: TransportConfig,
}

/// Timing of the inactivity prompt / auto-submit protocol and command words.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// Idle time before the rating prompt is sent.
    #[serde(default = "default_prompt_delay_secs")]
    pub prompt_delay_secs: u64,

    /// Time after the prompt before feedback is auto-submitted (or the session closed).
    #[serde(default = "default_expiry_timeout_secs")]
    pub expiry_timeout_secs: u64,

    /// Interval between sweeps.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Rating recorded when a prompt goes unanswered.
    #[serde(default = "default_auto_rating")]
    pub default_auto_rating: u8,

    /// Offset from UTC used for time-of-day greetings.
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,

    #[serde(default = "default_help_commands")]
    pub help_commands: Vec<String>,

    #[serde(default = "default_end_commands")]
    pub end_commands: Vec<String>,

    #[serde(default = "default_skip_commands")]
    pub skip_commands: Vec<String>,
}

fn default_prompt_delay_secs() -> u64 {
    300
}

fn default_expiry_timeout_secs() -> u64 {
    300
}

fn default_sweep_interval_secs() -> u64 {
    60
}

fn default_auto_rating() -> u8 {
    Rating::MAX
}

fn default_utc_offset_hours() -> i32 {
    7
}

fn default_help_commands() -> Vec<String> {
    vec!["/help".to_string()]
}

fn default_end_commands() -> Vec<String> {
    vec!["/end".to_string(), "/selesai".to_string()]
}

fn default_skip_commands() -> Vec<String> {
    vec!["/skip".to_string()]
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            prompt_delay_secs: default_prompt_delay_secs(),
            expiry_timeout_secs: default_expiry_timeout_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            default_auto_rating: default_auto_rating(),
            utc_offset_hours: default_utc_offset_hours(),
            help_commands: default_help_commands(),
            end_commands: default_end_commands(),
            skip_commands: default_skip_commands(),
        }
    }
}

impl ConversationConfig {
    pub fn prompt_delay(&self) -> Duration {
        Duration::from_secs(self.prompt_delay_secs)
    }

    pub fn expiry_timeout(&self) -> Duration {
        Duration::from_secs(self.expiry_timeout_secs)
    }

    /// Sweep interval, never shorter than one second.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }

    /// The auto-submit rating, falling back to 5 when misconfigured.
    pub fn auto_rating(&self) -> Rating {
        Rating::new(self.default_auto_rating).unwrap_or_else(|_| Rating::max())
    }

    pub fn is_help_command(&self, text: &str) -> bool {
        matches_command(&self.help_commands, text)
    }

    pub fn is_end_command(&self, text: &str) -> bool {
        matches_command(&self.end_commands, text)
    }

    pub fn is_skip_command(&self, text: &str) -> bool {
        matches_command(&self.skip_commands, text)
    }
}

fn matches_command(commands: &[String], text: &str) -> bool {
    let text = text.trim();
    commands.iter().any(|c| c.eq_ignore_ascii_case(text))
}

/// Per-session message rate limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Minimum seconds between two accepted messages.
    #[serde(default = "default_min_gap_secs")]
    pub min_gap_secs: u64,

    /// Sliding window length in seconds.
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// Maximum accepted messages per window.
    #[serde(default = "default_max_messages")]
    pub max_messages: usize,
}

fn default_min_gap_secs() -> u64 {
    3
}

fn default_window_secs() -> u64 {
    600
}

fn default_max_messages() -> usize {
    20
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            min_gap_secs: default_min_gap_secs(),
            window_secs: default_window_secs(),
            max_messages: default_max_messages(),
        }
    }
}

impl RateLimitConfig {
    pub fn min_gap(&self) -> Duration {
        Duration::from_secs(self.min_gap_secs)
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

/// AI answering backend endpoint (the API key comes from `PARLEY_AI_API_KEY`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default = "default_ai_base_url")]
    pub base_url: String,

    #[serde(default = "default_ai_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_ai_base_url() -> String {
    "https://api.dify.ai/v1".to_string()
}

fn default_ai_timeout_secs() -> u64 {
    30
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            base_url: default_ai_base_url(),
            timeout_secs: default_ai_timeout_secs(),
        }
    }
}

impl AiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Chat transport gateway (the inbound token comes from `PARLEY_GATEWAY_TOKEN`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    #[serde(default = "default_gateway_url")]
    pub gateway_url: String,

    #[serde(default = "default_send_timeout_secs")]
    pub send_timeout_secs: u64,
}

fn default_gateway_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_send_timeout_secs() -> u64 {
    10
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            gateway_url: default_gateway_url(),
            send_timeout_secs: default_send_timeout_secs(),
        }
    }
}

impl TransportConfig {
    pub fn send_timeout(&self) -> Duration {
        Duration::from_secs(self.send_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bot_config_default_values() {
        let config = BotConfig::default();
        assert_eq!(config.conversation.prompt_delay(), Duration::from_secs(300));
        assert_eq!(config.conversation.expiry_timeout(), Duration::from_secs(300));
        assert_eq!(config.conversation.sweep_interval(), Duration::from_secs(60));
        assert_eq!(config.conversation.auto_rating().value(), 5);
        assert_eq!(config.rate_limit.min_gap(), Duration::from_secs(3));
        assert_eq!(config.rate_limit.window(), Duration::from_secs(600));
        assert_eq!(config.rate_limit.max_messages, 20);
        assert_eq!(config.ai.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_bot_config_deserialize_empty() {
        let config: BotConfig = toml::from_str("").unwrap();
        assert_eq!(config.conversation.prompt_delay_secs, 300);
        assert_eq!(config.conversation.end_commands, vec!["/end", "/selesai"]);
        assert_eq!(config.transport.gateway_url, "http://127.0.0.1:8080");
    }

    #[test]
    fn test_bot_config_deserialize_partial_sections() {
        let toml_str = r#"
[conversation]
prompt_delay_secs = 120
default_auto_rating = 4
end_commands = ["/bye"]

[rate_limit]
max_messages = 5
"#;
        let config: BotConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.conversation.prompt_delay_secs, 120);
        assert_eq!(config.conversation.expiry_timeout_secs, 300);
        assert_eq!(config.conversation.auto_rating().value(), 4);
        assert!(config.conversation.is_end_command("/BYE"));
        assert!(!config.conversation.is_end_command("/selesai"));
        assert_eq!(config.rate_limit.max_messages, 5);
        assert_eq!(config.rate_limit.min_gap_secs, 3);
    }

    #[test]
    fn test_commands_are_case_insensitive() {
        let config = ConversationConfig::default();
        assert!(config.is_help_command("/HELP"));
        assert!(config.is_end_command(" /Selesai "));
        assert!(config.is_skip_command("/Skip"));
        assert!(!config.is_skip_command("skip"));
    }

    #[test]
    fn test_invalid_auto_rating_falls_back_to_max() {
        let config = ConversationConfig {
            default_auto_rating: 9,
            ..ConversationConfig::default()
        };
        assert_eq!(config.auto_rating(), Rating::max());
    }

    #[test]
    fn test_sweep_interval_floor() {
        let config = ConversationConfig {
            sweep_interval_secs: 0,
            ..ConversationConfig::default()
        };
        assert_eq!(config.sweep_interval(), Duration::from_secs(1));
    }
}
