use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "AI-Doctor";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Most recent chat turns shown to the completion service.
pub const DEFAULT_HISTORY_WINDOW: usize = 50;
/// Records rendered per category before the "N more" notice.
pub const DEFAULT_SECTION_CAP: usize = 5;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default tracing filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "ai_doctor_lib=info"
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required setting {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Rendering policy for the assembled clinical context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextConfig {
    pub section_cap: usize,
    /// Shown when the patient has no triage status.
    pub default_status: String,
    /// Shown when the patient has no triage priority.
    pub default_priority: String,
    /// Clock times in the context are rendered at this UTC offset.
    pub display_offset_minutes: i32,
}

impl ContextConfig {
    pub fn display_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.display_offset_minutes * 60).unwrap_or_else(|| Utc.fix())
    }
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            section_cap: DEFAULT_SECTION_CAP,
            default_status: "DEĞERLENDİRME".to_string(),
            default_priority: "orta".to_string(),
            // Europe/Istanbul, no DST.
            display_offset_minutes: 180,
        }
    }
}

/// Parameters forwarded to the completion service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionConfig {
    pub model: String,
    pub chat_temperature: f32,
    pub chat_max_tokens: Option<u32>,
    pub analysis_temperature: f32,
    pub analysis_max_tokens: Option<u32>,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            chat_temperature: 0.7,
            chat_max_tokens: Some(800),
            analysis_temperature: 0.7,
            analysis_max_tokens: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantConfig {
    pub history_window: usize,
    /// Overrides the built-in persona preamble. An empty string drops it.
    pub persona: Option<String>,
    pub context: ContextConfig,
    pub completion: CompletionConfig,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            history_window: DEFAULT_HISTORY_WINDOW,
            persona: None,
            context: ContextConfig::default(),
            completion: CompletionConfig::default(),
        }
    }
}

impl AssistantConfig {
    /// Defaults overlaid with `AI_DOCTOR_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(model) = lookup("AI_DOCTOR_MODEL").filter(|m| !m.trim().is_empty()) {
            config.completion.model = model;
        }
        if let Some(t) = parse_setting(&lookup, "AI_DOCTOR_TEMPERATURE")? {
            config.completion.chat_temperature = t;
            config.completion.analysis_temperature = t;
        }
        if let Some(max) = parse_setting(&lookup, "AI_DOCTOR_MAX_TOKENS")? {
            config.completion.chat_max_tokens = Some(max);
        }
        if let Some(window) = parse_setting(&lookup, "AI_DOCTOR_HISTORY_WINDOW")? {
            config.history_window = window;
        }
        if let Some(cap) = parse_setting(&lookup, "AI_DOCTOR_SECTION_CAP")? {
            config.context.section_cap = cap;
        }
        if let Some(offset) = parse_setting::<i32>(&lookup, "AI_DOCTOR_UTC_OFFSET_MINUTES")? {
            if !(-14 * 60..=14 * 60).contains(&offset) {
                return Err(ConfigError::Invalid {
                    key: "AI_DOCTOR_UTC_OFFSET_MINUTES",
                    value: offset.to_string(),
                });
            }
            config.context.display_offset_minutes = offset;
        }
        Ok(config)
    }
}

/// Connection settings for the HTTP completion client.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientConfig {
    pub base_url: String,
    #[serde(skip_serializing)]
    pub api_key: String,
    pub timeout_secs: u64,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            timeout_secs: 120,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_key = lookup("OPENAI_API_KEY")
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::Missing("OPENAI_API_KEY"))?;
        let mut config = Self::new(api_key);
        if let Some(url) = lookup("OPENAI_BASE_URL").filter(|u| !u.trim().is_empty()) {
            config.base_url = url;
        }
        if let Some(timeout) = parse_setting(&lookup, "AI_DOCTOR_TIMEOUT_SECS")? {
            config.timeout_secs = timeout;
        }
        Ok(config)
    }
}

fn parse_setting<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
    }
}
