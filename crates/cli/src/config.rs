//! Configuration loading from dragoman.toml.

use serde::Deserialize;
use std::path::Path;

/// Top-level configuration.
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Language-model backend configuration.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Google Maps configuration.
    #[serde(default)]
    pub maps: MapsConfig,
}

/// Backend provider configuration.
#[derive(Debug, Deserialize)]
pub struct BackendConfig {
    /// Model to use.
    #[serde(default = "default_model")]
    pub model: String,

    /// Gemini API key. Falls back to the GEMINI_API_KEY environment
    /// variable when absent.
    pub api_key: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_key: None,
        }
    }
}

/// Google Maps configuration.
#[derive(Debug, Deserialize, Default)]
pub struct MapsConfig {
    /// Maps API key. Falls back to the GMAPS_API_KEY environment variable
    /// when absent.
    pub api_key: Option<String>,
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load the config file when it exists, defaults otherwise.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Resolve the Gemini API key (config, then environment).
    pub fn gemini_key(&self) -> Result<String, ConfigError> {
        self.backend
            .api_key
            .clone()
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
            .ok_or(ConfigError::MissingGeminiKey)
    }

    /// Resolve the Maps API key (config, then environment).
    pub fn maps_key(&self) -> Result<String, ConfigError> {
        self.maps
            .api_key
            .clone()
            .or_else(|| std::env::var("GMAPS_API_KEY").ok())
            .ok_or(ConfigError::MissingMapsKey)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("Gemini key not configured: set backend.api_key or GEMINI_API_KEY")]
    MissingGeminiKey,

    #[error("Maps key not configured: set maps.api_key or GMAPS_API_KEY")]
    MissingMapsKey,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_config() {
        let config = Config::parse(
            r#"
[backend]
model = "gemini-2.5-flash"
api_key = "g-key"

[maps]
api_key = "m-key"
"#,
        )
        .unwrap();
        assert_eq!(config.backend.model, "gemini-2.5-flash");
        assert_eq!(config.gemini_key().unwrap(), "g-key");
        assert_eq!(config.maps_key().unwrap(), "m-key");
    }

    #[test]
    fn empty_config_uses_default_model() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.backend.model, "gemini-2.0-flash");
        assert!(config.backend.api_key.is_none());
    }
}
