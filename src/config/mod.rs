use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cli::OutputFormat;
use crate::utils::validate_language_code;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// YouTube caption provider settings
    pub youtube: YoutubeConfig,

    /// Application settings
    pub app: AppConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct YoutubeConfig {
    /// User agent sent with every request
    pub user_agent: String,

    /// Accept-Language header, which affects track names
    pub accept_language: String,

    /// Per-request timeout; requests may block indefinitely when unset
    pub request_timeout_secs: Option<u64>,

    /// Keep basic formatting tags such as `<i>` in caption text
    pub preserve_formatting: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Languages the CLI asks for when none are given
    pub default_languages: Vec<String>,

    /// Output format the CLI uses when none is given
    pub default_output_format: String,
}

/// A configuration file with invalid values
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("default_languages must not be empty")]
    NoDefaultLanguages,

    #[error("invalid language code in default_languages: '{0}'")]
    InvalidLanguage(String),

    #[error("invalid default_output_format: '{0}' (expected json, text, srt or vtt)")]
    InvalidOutputFormat(String),

    #[error("request_timeout_secs must be greater than zero")]
    ZeroTimeout,
}

impl Default for YoutubeConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: "en-US".to_string(),
            request_timeout_secs: None,
            preserve_formatting: false,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_languages: vec!["en".to_string()],
            default_output_format: "text".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            youtube: YoutubeConfig::default(),
            app: AppConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the given or discovered file, or fall back to defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let config_path = match explicit {
            Some(path) => path.to_path_buf(),
            None => Self::config_path()?,
        };

        if config_path.exists() {
            Self::load_from(&config_path)
        } else if explicit.is_some() {
            anyhow::bail!("Config file not found: {}", config_path.display())
        } else {
            tracing::debug!(path = %config_path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Load and validate configuration from a file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs_err::read_to_string(path).context("Failed to read config file")?;

        let config: Config =
            serde_yaml::from_str(&content).context("Failed to parse config file")?;

        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;

        fs_err::write(path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Get configuration file path
    pub fn config_path() -> Result<PathBuf> {
        // ./config.yaml wins over the per-user file
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        Self::user_config_path()
    }

    /// Per-user configuration file path
    pub fn user_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Could not determine config directory")?;

        Ok(config_dir.join("youtube-transcript-mcp").join("config.yaml"))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.app.default_languages.is_empty() {
            return Err(ConfigError::NoDefaultLanguages);
        }

        if let Some(code) = self
            .app
            .default_languages
            .iter()
            .find(|code| !validate_language_code(code))
        {
            return Err(ConfigError::InvalidLanguage(code.clone()));
        }

        self.default_output_format()?;

        if self.youtube.request_timeout_secs == Some(0) {
            return Err(ConfigError::ZeroTimeout);
        }

        Ok(())
    }

    /// Parsed default output format
    pub fn default_output_format(&self) -> Result<OutputFormat, ConfigError> {
        self.app
            .default_output_format
            .parse()
            .map_err(|_| ConfigError::InvalidOutputFormat(self.app.default_output_format.clone()))
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  User Agent: {}", self.youtube.user_agent);
        println!("  Accept-Language: {}", self.youtube.accept_language);
        match self.youtube.request_timeout_secs {
            Some(secs) => println!("  Request Timeout: {}s", secs),
            None => println!("  Request Timeout: none"),
        }
        println!("  Preserve Formatting: {}", self.youtube.preserve_formatting);
        println!("  Default Languages: {}", self.app.default_languages.join(", "));
        println!("  Default Format: {}", self.app.default_output_format);
    }
}
