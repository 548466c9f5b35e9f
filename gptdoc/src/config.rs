//! Generation settings from gptdoc.toml and the environment

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Settings shared by the text and image generation clients
///
/// The assembly engine takes no configuration; only the service clients do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Key for the chat completion and URL-returning image endpoints
    pub openai_api_key: Option<String>,

    /// Key for the payload-based image endpoint
    pub stability_api_key: Option<String>,

    /// Base URL of the chat completion / image generation API
    pub openai_base_url: String,

    /// Base URL of the payload-based image generation API
    pub stability_base_url: String,

    /// Temperature used when turning a selection into an image prompt
    pub image_temperature: f64,

    /// Target word count of generated image prompts
    pub image_max_words: u32,

    /// Chat model used to write image prompts
    pub image_prompt_model: String,

    /// Timeout for each HTTP request, in seconds
    pub request_timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            stability_api_key: None,
            openai_base_url: "https://api.openai.com/v1".to_string(),
            stability_base_url: "https://api.stability.ai".to_string(),
            image_temperature: 0.5,
            image_max_words: 40,
            image_prompt_model: "gpt-3.5-turbo-16k".to_string(),
            request_timeout_secs: 120,
        }
    }
}

impl GenerationConfig {
    /// Load configuration from a gptdoc.toml file
    ///
    /// Missing keys fall back to their defaults.
    ///
    /// # Parameters
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    /// * `Ok(GenerationConfig)` - Successfully loaded configuration
    /// * `Err(ConfigError)` - Error reading or parsing the file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(&path)?;
        let config: GenerationConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a gptdoc.toml file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Resolve the effective configuration
    ///
    /// Starts from `path` when given (defaults otherwise), then applies the
    /// process environment on top.
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                log::info!("Reading configuration from {}", path.display());
                Self::load(path)?
            }
            None => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Override settings from environment-style variables
    ///
    /// Recognized names: `OPENAI_API_KEY`, `STABILITY_API_KEY`,
    /// `IMAGE_TEMPERATURE`, `IMAGE_MAX_WORDS`, `IMAGE_PROMPT_GEN_MODEL`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(key) = get("OPENAI_API_KEY") {
            self.openai_api_key = Some(key);
        }
        if let Some(key) = get("STABILITY_API_KEY") {
            self.stability_api_key = Some(key);
        }
        if let Some(value) = get("IMAGE_TEMPERATURE") {
            self.image_temperature =
                value
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| ConfigError::InvalidValue {
                        name: "IMAGE_TEMPERATURE",
                        value,
                    })?;
        }
        if let Some(value) = get("IMAGE_MAX_WORDS") {
            self.image_max_words =
                value
                    .trim()
                    .parse::<u32>()
                    .map_err(|_| ConfigError::InvalidValue {
                        name: "IMAGE_MAX_WORDS",
                        value,
                    })?;
        }
        if let Some(model) = get("IMAGE_PROMPT_GEN_MODEL") {
            self.image_prompt_model = model;
        }
        Ok(())
    }
}

/// Errors that can occur when loading or saving configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid value '{value}' for {name}")]
    InvalidValue { name: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = GenerationConfig::default();
        assert_eq!(config.image_temperature, 0.5);
        assert_eq!(config.image_max_words, 40);
        assert_eq!(config.image_prompt_model, "gpt-3.5-turbo-16k");
        assert!(config.openai_api_key.is_none());
    }

    #[test]
    fn test_parse_partial_toml() {
        let toml_content = r#"
openai_api_key = "sk-test"
image_max_words = 25
"#;
        let config: GenerationConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.openai_api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.image_max_words, 25);
        assert_eq!(config.image_temperature, 0.5);
        assert_eq!(config.openai_base_url, "https://api.openai.com/v1");
    }

    #[test]
    fn test_env_overrides() {
        let mut config = GenerationConfig::default();
        config
            .apply_env(env(&[
                ("OPENAI_API_KEY", "sk-env"),
                ("STABILITY_API_KEY", "st-env"),
                ("IMAGE_TEMPERATURE", "0.9"),
                ("IMAGE_MAX_WORDS", "60"),
                ("IMAGE_PROMPT_GEN_MODEL", "gpt-4"),
            ]))
            .unwrap();

        assert_eq!(config.openai_api_key.as_deref(), Some("sk-env"));
        assert_eq!(config.stability_api_key.as_deref(), Some("st-env"));
        assert_eq!(config.image_temperature, 0.9);
        assert_eq!(config.image_max_words, 60);
        assert_eq!(config.image_prompt_model, "gpt-4");
    }

    #[test]
    fn test_blank_env_values_are_ignored() {
        let mut config = GenerationConfig::default();
        config.apply_env(env(&[("OPENAI_API_KEY", "  ")])).unwrap();
        assert!(config.openai_api_key.is_none());
    }

    #[test]
    fn test_invalid_env_value() {
        let mut config = GenerationConfig::default();
        let result = config.apply_env(env(&[("IMAGE_MAX_WORDS", "lots")]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue {
                name: "IMAGE_MAX_WORDS",
                ..
            })
        ));
    }

    #[test]
    fn test_config_roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gptdoc.toml");
        let config = GenerationConfig {
            openai_api_key: Some("sk-file".to_string()),
            image_max_words: 12,
            ..GenerationConfig::default()
        };
        config.save(&path).unwrap();
        assert_eq!(GenerationConfig::load(&path).unwrap(), config);
    }
}
