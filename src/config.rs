//! Client configuration: defaults, TOML loading and validation.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::image::{ImageNormalizer, ResampleFilter, TargetSize, SCREENSHOT_SIZE};

/// File name looked up under the platform config directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Settings shared by the HTTP and chat clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the prediction endpoints.
    pub server_url: String,

    /// WebSocket URL of the chat assistant.
    pub chat_url: String,

    /// HTTP request timeout in seconds.
    pub timeout_secs: u64,

    /// Screenshot normalization settings.
    pub normalize: NormalizeConfig,
}

/// Target size and filter for screenshot normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    pub height: u32,
    pub width: u32,
    pub filter: ResampleFilter,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:5000".to_string(),
            chat_url: "ws://localhost:5000/ws/".to_string(),
            timeout_secs: 30,
            normalize: NormalizeConfig::default(),
        }
    }
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            height: SCREENSHOT_SIZE,
            width: SCREENSHOT_SIZE,
            filter: ResampleFilter::default(),
        }
    }
}

impl NormalizeConfig {
    #[must_use]
    pub const fn target(&self) -> TargetSize {
        TargetSize {
            height: self.height,
            width: self.width,
        }
    }
}

impl ClientConfig {
    /// Parse a configuration from TOML text. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Toml`] for malformed TOML or mistyped values.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load and validate a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file cannot be read or parsed, or an
    /// invalid-parameter error if a value is out of range.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let text = fs::read_to_string(path).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&text).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Platform location of the user configuration file.
    ///
    /// - Linux: `~/.config/errshot/config.toml`
    /// - macOS: `~/Library/Application Support/errshot/config.toml`
    /// - Windows: `%APPDATA%\errshot\config.toml`
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("errshot").join(CONFIG_FILE_NAME))
    }

    /// Load the user configuration file if there is one, else the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but is invalid.
    pub fn discover() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(path),
            _ => Ok(Self::default()),
        }
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any parameter is out of valid range.
    pub fn validate(&self) -> Result<()> {
        if !has_scheme(&self.server_url, &["http://", "https://"]) {
            return Err(Error::InvalidParameter {
                name: "server_url".to_string(),
                reason: "must start with http:// or https://".to_string(),
            });
        }

        if !has_scheme(&self.chat_url, &["ws://", "wss://"]) {
            return Err(Error::InvalidParameter {
                name: "chat_url".to_string(),
                reason: "must start with ws:// or wss://".to_string(),
            });
        }

        if self.timeout_secs == 0 {
            return Err(Error::InvalidParameter {
                name: "timeout_secs".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }

        self.normalize.target().validate()
    }

    /// Normalizer for screenshots sent to the OS error endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured target size is invalid.
    pub fn normalizer(&self) -> Result<ImageNormalizer> {
        ImageNormalizer::new(self.normalize.target(), self.normalize.filter)
    }
}

fn has_scheme(url: &str, schemes: &[&str]) -> bool {
    schemes
        .iter()
        .any(|scheme| url.len() > scheme.len() && url.to_ascii_lowercase().starts_with(scheme))
}
