//! Application configuration
//!
//! Server endpoints, request timeout and recording settings, loaded from a
//! TOML file.

use crate::{Result, VoiceCheckError};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Remote inference / watermark server
    pub server: ServerConfig,

    /// Microphone capture settings
    pub recording: RecordingConfig,

    /// Where downloaded server outputs are written
    pub download_dir: Option<PathBuf>,
}

/// Remote endpoints for every server operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// `POST` endpoint returning `result_binary`
    pub classify_url: String,

    /// `GET` endpoint returning the last classification
    pub poll_url: String,

    /// `POST` endpoint embedding a watermark
    pub watermark_add_url: String,

    /// `POST` endpoint checking for a watermark
    pub watermark_detect_url: String,

    /// `POST` endpoint for adversarial protection plus watermark
    pub protect_url: String,

    /// Upper bound on a single request, in seconds
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }
}

impl ServerConfig {
    /// Derive every endpoint from one server root
    pub fn with_base_url(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            classify_url: format!("{}/upload_audio", base),
            poll_url: format!("{}/get_binary_classification_result", base),
            watermark_add_url: format!("{}/generate", base),
            watermark_detect_url: format!("{}/detect", base),
            protect_url: format!("{}/attack", base),
            request_timeout_secs: 30,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    fn urls(&self) -> [(&'static str, &str); 5] {
        [
            ("classify_url", self.classify_url.as_str()),
            ("poll_url", self.poll_url.as_str()),
            ("watermark_add_url", self.watermark_add_url.as_str()),
            ("watermark_detect_url", self.watermark_detect_url.as_str()),
            ("protect_url", self.protect_url.as_str()),
        ]
    }
}

/// Microphone capture settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    /// Requested capture rate in Hz
    pub sample_rate: u32,

    /// Requested channel count
    pub channels: u16,

    /// Directory for finished recordings (system temp dir when unset)
    pub output_dir: Option<PathBuf>,

    /// File extension of finished recordings
    pub extension: String,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            channels: 1,
            output_dir: None,
            extension: "wav".to_string(),
        }
    }
}

impl RecordingConfig {
    pub fn output_dir(&self) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

impl AppConfig {
    /// Default location: `<config_dir>/voicecheck/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("voicecheck").join("config.toml"))
    }

    /// Load from an explicit path; the file must exist
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            VoiceCheckError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let config: AppConfig = toml::from_str(&content).map_err(|e| {
            VoiceCheckError::ConfigError(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        config.validate()?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load from the default location, falling back to defaults when absent
    pub fn load_or_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(path),
            _ => {
                debug!("No configuration file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Point every endpoint at a different server
    pub fn with_server(mut self, base_url: &str) -> Self {
        let timeout = self.server.request_timeout_secs;
        self.server = ServerConfig::with_base_url(base_url);
        self.server.request_timeout_secs = timeout;
        self
    }

    pub fn download_dir(&self) -> PathBuf {
        self.download_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        for (name, url) in self.server.urls() {
            Url::parse(url).map_err(|e| {
                VoiceCheckError::ConfigError(format!("Invalid {} '{}': {}", name, url, e))
            })?;
        }

        if self.server.request_timeout_secs == 0 {
            return Err(VoiceCheckError::ConfigError(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }

        if self.recording.sample_rate == 0 || self.recording.channels == 0 {
            return Err(VoiceCheckError::ConfigError(
                "Recording sample_rate and channels must be non-zero".to_string(),
            ));
        }

        if self.recording.extension.is_empty() {
            return Err(VoiceCheckError::ConfigError(
                "Recording extension must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}
