//! Data models and structures
//!
//! Defines the request payloads accepted by the transports and the
//! process-wide configuration loaded at startup.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// One caption-and-image job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
        }
    }

    /// Rejects prompts that are empty or whitespace only.
    pub fn validate(&self) -> Result<()> {
        if self.prompt.trim().is_empty() {
            return Err(Error::InvalidRequest("prompt must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Telegram chat identifier.
///
/// The Bot API uses integers but callers of the trigger endpoint frequently
/// send it as a string, so both shapes are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatId {
    Id(i64),
    Username(String),
}

impl ChatId {
    pub fn is_empty(&self) -> bool {
        matches!(self, ChatId::Username(name) if name.trim().is_empty())
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatId::Id(id) => write!(f, "{}", id),
            ChatId::Username(name) => f.write_str(name),
        }
    }
}

impl From<i64> for ChatId {
    fn from(id: i64) -> Self {
        ChatId::Id(id)
    }
}

/// Body of the `/img` trigger endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerRequest {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub chat_id: Option<ChatId>,
}

impl TriggerRequest {
    /// Splits the trigger into a validated chat target and generation request.
    pub fn into_parts(self) -> Result<(ChatId, GenerationRequest)> {
        let chat_id = self
            .chat_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::InvalidRequest("chatId is required".to_string()))?;
        let request = GenerationRequest::new(self.prompt.unwrap_or_default());
        request.validate()?;
        Ok((chat_id, request))
    }
}

pub const DEFAULT_COHERE_API_BASE: &str = "https://api.cohere.ai";
pub const DEFAULT_STABILITY_API_HOST: &str = "https://api.stability.ai";
pub const DEFAULT_STABILITY_ENGINE_ID: &str = "stable-diffusion-v1-6";
pub const DEFAULT_TELEGRAM_API_BASE: &str = "https://api.telegram.org";
pub const DEFAULT_FONT_FAMILY: &str = "Arial";

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub caption_api_key: String,
    pub image_api_key: String,
    pub telegram_bot_token: Option<String>,
    pub port: Option<u16>,
    pub listen_address: String,
    pub cohere_api_base: String,
    pub stability_api_host: String,
    pub stability_engine_id: String,
    pub telegram_api_base: String,
    pub font_family: String,
    pub font_path: Option<String>,
    pub parallel_generation: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        load_dotenv(dotenvy::dotenv())?;
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| Error::Config(format!("{} not set", key)))
        };

        let port = match lookup("PORT") {
            Some(raw) => Some(
                raw.trim()
                    .parse::<u16>()
                    .map_err(|_| Error::Config(format!("Invalid PORT '{}'", raw)))?,
            ),
            None => None,
        };

        let parallel_generation = match lookup("PARALLEL_GENERATION") {
            Some(raw) => parse_flag(&raw)
                .ok_or_else(|| Error::Config(format!("Invalid PARALLEL_GENERATION '{}'", raw)))?,
            None => false,
        };

        Ok(Self {
            caption_api_key: required("COHERE_API_KEY")?,
            image_api_key: required("STABILITY_API_KEY")?,
            telegram_bot_token: lookup("TELEGRAM_BOT_TOKEN").filter(|t| !t.trim().is_empty()),
            port,
            listen_address: lookup("LISTEN_ADDRESS").unwrap_or_else(|| "0.0.0.0".to_string()),
            cohere_api_base: lookup("COHERE_API_BASE")
                .unwrap_or_else(|| DEFAULT_COHERE_API_BASE.to_string()),
            stability_api_host: lookup("STABILITY_API_HOST")
                .unwrap_or_else(|| DEFAULT_STABILITY_API_HOST.to_string()),
            stability_engine_id: lookup("STABILITY_ENGINE_ID")
                .unwrap_or_else(|| DEFAULT_STABILITY_ENGINE_ID.to_string()),
            telegram_api_base: lookup("TELEGRAM_API_BASE")
                .unwrap_or_else(|| DEFAULT_TELEGRAM_API_BASE.to_string()),
            font_family: lookup("CAPTION_FONT_FAMILY")
                .unwrap_or_else(|| DEFAULT_FONT_FAMILY.to_string()),
            font_path: lookup("CAPTION_FONT_PATH").filter(|p| !p.trim().is_empty()),
            parallel_generation,
        })
    }

    pub fn require_telegram_token(&self) -> Result<&str> {
        self.telegram_bot_token
            .as_deref()
            .ok_or_else(|| Error::Config("TELEGRAM_BOT_TOKEN not set".to_string()))
    }
}

/// A missing `.env` is fine; an unreadable or malformed one is not.
fn load_dotenv(result: std::result::Result<PathBuf, dotenvy::Error>) -> Result<()> {
    match result {
        Ok(path) => {
            tracing::debug!("Loaded environment from {}", path.display());
            Ok(())
        }
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
