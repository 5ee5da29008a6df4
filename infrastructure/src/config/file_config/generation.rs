//! Text generation configuration from TOML (`[generation]` section)

use conclave_domain::config::validation::{ConfigIssue, ConfigIssueCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Backend used for transcendent synthesis and persona agents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextProvider {
    /// Deterministic local completions, no network
    #[default]
    Offline,
    /// OpenAI-compatible chat completions endpoint
    Http,
}

impl TextProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextProvider::Offline => "offline",
            TextProvider::Http => "http",
        }
    }
}

impl fmt::Display for TextProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TextProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "offline" | "local" => Ok(TextProvider::Offline),
            "http" | "openai" => Ok(TextProvider::Http),
            other => Err(format!("unknown provider: {}", other)),
        }
    }
}

/// Raw generation configuration from TOML
///
/// # Example
///
/// ```toml
/// [generation]
/// provider = "http"
/// endpoint = "http://localhost:11434/v1"
/// model = "llama3"
/// api_key_env = "OPENAI_API_KEY"
/// temperature = 0.7
/// max_tokens = 1024
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileGenerationConfig {
    /// "offline" or "http"
    pub provider: String,
    /// Base URL of the OpenAI-compatible API (required for "http")
    pub endpoint: Option<String>,
    pub model: String,
    /// Environment variable holding the API key; the key is optional for local servers
    pub api_key_env: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl Default for FileGenerationConfig {
    fn default() -> Self {
        Self {
            provider: TextProvider::Offline.as_str().to_string(),
            endpoint: None,
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            temperature: Some(0.7),
            max_tokens: Some(1024),
        }
    }
}

impl FileGenerationConfig {
    /// Parse the provider, falling back to offline with an error issue
    pub fn parse_provider(&self) -> (TextProvider, Vec<ConfigIssue>) {
        match self.provider.parse::<TextProvider>() {
            Ok(TextProvider::Http) if self.endpoint().is_none() => {
                let issue = ConfigIssue::error(
                    ConfigIssueCode::MissingEndpoint,
                    "generation.endpoint: required when provider is 'http'",
                );
                (TextProvider::Offline, vec![issue])
            }
            Ok(provider) => (provider, vec![]),
            Err(_) => {
                let issue = ConfigIssue::error(
                    ConfigIssueCode::UnknownProvider,
                    format!(
                        "generation.provider: unknown value '{}' (expected 'offline' or 'http')",
                        self.provider
                    ),
                );
                (TextProvider::Offline, vec![issue])
            }
        }
    }

    /// Trimmed, non-empty endpoint
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint
            .as_deref()
            .map(str::trim)
            .filter(|endpoint| !endpoint.is_empty())
    }
}
