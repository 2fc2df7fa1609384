//! Service endpoints and credentials.
//!
//! A [`Config`] is built once at startup and handed to whatever performs
//! network calls. Sources, lowest precedence first: built-in defaults, an
//! optional TOML file, then environment variables.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::error::{Result, ToneLensError};

pub const DEFAULT_CONFIG_FILE: &str = "tone-lens.toml";
pub const DEFAULT_TONE_VERSION: &str = "2017-09-21";
pub const DEFAULT_TEXT_SERVICES_URL: &str = "https://api.deepai.org";

pub const ENV_TONE_ANALYZER_URL: &str = "TONE_ANALYZER_URL";
pub const ENV_TONE_ANALYZER_APIKEY: &str = "TONE_ANALYZER_APIKEY";
pub const ENV_DEEPAI_APIKEY: &str = "DEEPAI_APIKEY";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ToneAnalyzerConfig {
    /// Service instance URL, e.g. `https://api.eu-de.tone-analyzer.watson.cloud.ibm.com/instances/<id>`.
    pub url: String,
    pub api_key: String,
    pub version: String,
}

impl Default for ToneAnalyzerConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            version: DEFAULT_TONE_VERSION.to_string(),
        }
    }
}

/// Summarization / text generation. Optional: no key disables both.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TextServicesConfig {
    pub base_url: String,
    pub api_key: String,
}

impl Default for TextServicesConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_TEXT_SERVICES_URL.to_string(),
            api_key: String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tone_analyzer: ToneAnalyzerConfig,
    pub text_services: TextServicesConfig,
    /// Text must be strictly longer than this (in chars) to trigger analysis.
    pub min_text_len: usize,
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tone_analyzer: ToneAnalyzerConfig::default(),
            text_services: TextServicesConfig::default(),
            min_text_len: 10,
            request_timeout_secs: 30,
        }
    }
}

impl Config {
    /// Parse a TOML document. Missing keys fall back to defaults.
    pub fn from_toml_str(s: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Load from `path` (or [`DEFAULT_CONFIG_FILE`] when it exists), then
    /// apply environment overrides.
    ///
    /// An explicitly given path that cannot be read is an error; a missing
    /// default file is not.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::read_file(p)?,
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Self::read_file(default)?
                } else {
                    Config::default()
                }
            }
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| ToneLensError::ConfigFile {
            path: path.display().to_string(),
            detail: e.to_string(),
        })?;
        tracing::debug!(path = %path.display(), "loaded config file");
        Self::from_toml_str(&text).map_err(|e| ToneLensError::ConfigFile {
            path: path.display().to_string(),
            detail: e.to_string(),
        })
    }

    /// Override values from the environment. Empty variables are ignored.
    ///
    /// Takes a lookup function so tests need not touch the process env.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(v) = get(ENV_TONE_ANALYZER_URL) {
            self.tone_analyzer.url = v;
        }
        if let Some(v) = get(ENV_TONE_ANALYZER_APIKEY) {
            self.tone_analyzer.api_key = v;
        }
        if let Some(v) = get(ENV_DEEPAI_APIKEY) {
            self.text_services.api_key = v;
        }
    }

    /// `<url>/v3/tone?version=<version>`.
    pub fn tone_endpoint(&self) -> String {
        format!(
            "{}/v3/tone?version={}",
            self.tone_analyzer.url.trim_end_matches('/'),
            self.tone_analyzer.version
        )
    }

    /// `<base_url>/api/<name>`.
    pub fn text_service_endpoint(&self, name: &str) -> String {
        format!("{}/api/{}", self.text_services.base_url.trim_end_matches('/'), name)
    }

    pub fn validate_tone_analyzer(&self) -> Result<()> {
        if self.tone_analyzer.url.trim().is_empty() {
            return Err(ToneLensError::MissingConfig { field: "tone_analyzer.url" });
        }
        if self.tone_analyzer.api_key.trim().is_empty() {
            return Err(ToneLensError::MissingConfig { field: "tone_analyzer.api_key" });
        }
        Ok(())
    }

    pub fn text_services_enabled(&self) -> bool {
        !self.text_services.api_key.trim().is_empty()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
