//! Game configuration loaded from TOML.

use std::path::{Path, PathBuf};

use derive_getters::Getters;
use derive_more::{Display, Error};
use rabt_core::Timings;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::llm_client::{LlmConfig, LlmProvider};

/// Environment variable consulted when the provider-specific key is unset.
const FALLBACK_KEY_VAR: &str = "API_KEY";

/// Runtime configuration for the game.
#[derive(Debug, Clone, PartialEq, Getters, Serialize, Deserialize)]
pub struct RabtConfig {
    /// LLM provider (gemini, openai or anthropic).
    #[serde(default = "default_provider")]
    llm_provider: LlmProvider,

    /// LLM model name; the provider's default when unset.
    #[serde(default)]
    llm_model: Option<String>,

    /// Maximum tokens for LLM responses.
    #[serde(default = "default_max_tokens")]
    llm_max_tokens: u32,

    /// Override for the provider's API base URL.
    #[serde(default)]
    llm_base_url: Option<String>,

    /// File backing the key-value store.
    #[serde(default = "default_storage_path")]
    storage_path: PathBuf,

    /// Directory of pre-generated levels for offline play.
    #[serde(default)]
    levels_dir: Option<PathBuf>,

    /// Session delays.
    #[serde(default)]
    timings: Timings,
}

#[instrument]
fn default_provider() -> LlmProvider {
    LlmProvider::Gemini
}

#[instrument]
fn default_max_tokens() -> u32 {
    8192
}

#[instrument]
fn default_storage_path() -> PathBuf {
    PathBuf::from("rabt_store.json")
}

impl Default for RabtConfig {
    fn default() -> Self {
        Self {
            llm_provider: default_provider(),
            llm_model: None,
            llm_max_tokens: default_max_tokens(),
            llm_base_url: None,
            storage_path: default_storage_path(),
            levels_dir: None,
            timings: Timings::default(),
        }
    }
}

impl RabtConfig {
    /// Loads configuration from TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ConfigError::new(format!("Failed to read config file: {}", e))
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from TOML text.
    #[instrument(skip(content))]
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        if config.timings.tick_ms == 0 {
            return Err(ConfigError::new(
                "Invalid config: timings.tick_ms must be greater than zero".to_string(),
            ));
        }
        info!(provider = %config.llm_provider, "Config loaded successfully");
        Ok(config)
    }

    /// Loads `path` if it exists, otherwise returns the defaults.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            info!("No config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Points offline play at `dir`.
    #[instrument(skip(self, dir))]
    pub fn with_levels_dir(mut self, dir: PathBuf) -> Self {
        self.levels_dir = Some(dir);
        self
    }

    /// The model to request, falling back to the provider default.
    #[instrument(skip(self))]
    pub fn model(&self) -> String {
        self.llm_model
            .clone()
            .unwrap_or_else(|| self.llm_provider.default_model().to_string())
    }

    /// Creates LLM configuration from the process environment.
    ///
    /// Reads the provider's key variable (`GEMINI_API_KEY`, `OPENAI_API_KEY`
    /// or `ANTHROPIC_API_KEY`), then `API_KEY`.
    #[instrument(skip(self), fields(provider = ?self.llm_provider))]
    pub fn create_llm_config(&self) -> Result<LlmConfig, ConfigError> {
        self.llm_config_from(|var| std::env::var(var).ok())
    }

    /// Creates LLM configuration, resolving keys through `lookup`.
    #[instrument(skip(self, lookup), fields(provider = ?self.llm_provider))]
    pub fn llm_config_from(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<LlmConfig, ConfigError> {
        debug!("Creating LLM config");
        let var = self.llm_provider.api_key_var();
        let api_key = lookup(var)
            .or_else(|| lookup(FALLBACK_KEY_VAR))
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                ConfigError::new(format!(
                    "{} (or {}) environment variable not set",
                    var, FALLBACK_KEY_VAR
                ))
            })?;

        let config = LlmConfig::new(
            self.llm_provider,
            api_key,
            self.model(),
            self.llm_max_tokens,
        );
        Ok(match &self.llm_base_url {
            Some(url) => config.with_base_url(url.clone()),
            None => config,
        })
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
