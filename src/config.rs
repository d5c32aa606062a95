//! Configuration types, built from environment variables.

use std::path::PathBuf;

use secrecy::SecretString;

use crate::error::ConfigError;

pub const DEFAULT_CHAT_MODEL: &str = "claude-3-opus-20240229";
pub const DEFAULT_SYMPTOM_MODEL: &str = "claude-3-sonnet-20240229";
pub const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_VOICE_ID: &str = "pFZP5JQG7iQjIQuC4Bku";
pub const DEFAULT_VOICE_MODEL: &str = "eleven_monolingual_v1";
pub const DEFAULT_ELEVEN_LABS_BASE_URL: &str = "https://api.elevenlabs.io";

/// Text-generation collaborator settings.
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    pub api_key: SecretString,
    pub base_url: String,
    pub chat_model: String,
    pub chat_max_tokens: u32,
    pub symptom_model: String,
    pub symptom_max_tokens: u32,
}

impl AnthropicConfig {
    pub fn new(api_key: SecretString) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_ANTHROPIC_BASE_URL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            chat_max_tokens: 1000,
            symptom_model: DEFAULT_SYMPTOM_MODEL.to_string(),
            symptom_max_tokens: 1024,
        }
    }
}

/// Voice collaborator settings.
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    pub api_key: SecretString,
    pub base_url: String,
    pub voice_id: String,
    pub model_id: String,
    pub stability: f32,
    pub similarity_boost: f32,
}

impl VoiceConfig {
    pub fn new(api_key: SecretString) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_ELEVEN_LABS_BASE_URL.to_string(),
            voice_id: DEFAULT_VOICE_ID.to_string(),
            model_id: DEFAULT_VOICE_MODEL.to_string(),
            stability: 0.5,
            similarity_boost: 0.75,
        }
    }
}

/// Process-wide configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    /// Directory for rolling log files. Logs go to stderr only when unset.
    pub log_dir: Option<PathBuf>,
    /// `None` disables the chat and symptom-check functions.
    pub anthropic: Option<AnthropicConfig>,
    /// `None` disables the speech functions.
    pub voice: Option<VoiceConfig>,
}

impl AppConfig {
    /// Build config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup (the environment in
    /// production, a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = var("LYDIA_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_or(&var, "LYDIA_PORT", 8080u16)?;
        let db_path = var("LYDIA_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./data/lydia.db"));
        let log_dir = var("LYDIA_LOG_DIR").map(PathBuf::from);

        let anthropic = match var("ANTHROPIC_API_KEY") {
            Some(key) => {
                let mut cfg = AnthropicConfig::new(SecretString::from(key));
                if let Some(url) = var("ANTHROPIC_BASE_URL") {
                    cfg.base_url = url;
                }
                if let Some(model) = var("LYDIA_CHAT_MODEL") {
                    cfg.chat_model = model;
                }
                if let Some(model) = var("LYDIA_SYMPTOM_MODEL") {
                    cfg.symptom_model = model;
                }
                Some(cfg)
            }
            None => None,
        };

        let voice = match var("ELEVEN_LABS_API_KEY") {
            Some(key) => {
                let mut cfg = VoiceConfig::new(SecretString::from(key));
                if let Some(url) = var("ELEVEN_LABS_BASE_URL") {
                    cfg.base_url = url;
                }
                if let Some(id) = var("ELEVEN_LABS_VOICE_ID") {
                    cfg.voice_id = id;
                }
                if let Some(model) = var("ELEVEN_LABS_MODEL") {
                    cfg.model_id = model;
                }
                Some(cfg)
            }
            None => None,
        };

        Ok(Self {
            host,
            port,
            db_path,
            log_dir,
            anthropic,
            voice,
        })
    }

    /// `host:port` for the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T, F>(var: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            }),
        None => Ok(default),
    }
}
