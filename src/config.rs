use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::prompts::PromptLanguage;

/// Largest accepted plant photo (2 MiB)
pub const MAX_IMAGE_BYTES: usize = 2 * 1024 * 1024;

const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const DEFAULT_TEXT_MODEL: &str = "gemini-1.5-flash";
const DEFAULT_VISION_MODEL: &str = "gemini-1.5-flash";

/// Service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bind_address: String,
    pub port: u16,

    /// Usually supplied through `GEMINI_API_KEY` rather than the file
    #[serde(skip_serializing)]
    pub gemini_api_key: Option<String>,
    pub gemini_base_url: String,
    pub text_model: String,
    pub vision_model: String,
    pub request_timeout_secs: u64,

    pub max_image_bytes: usize,
    pub max_json_body_bytes: usize,

    /// Reject crop requests with absent or blank fields instead of
    /// interpolating a placeholder
    pub require_all_fields: bool,
    pub translation: PromptLanguage,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 3000,
            gemini_api_key: None,
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            vision_model: DEFAULT_VISION_MODEL.to_string(),
            request_timeout_secs: 30,
            max_image_bytes: MAX_IMAGE_BYTES,
            max_json_body_bytes: 64 * 1024,
            require_all_fields: false,
            translation: PromptLanguage::default(),
        }
    }
}

impl Config {
    /// Get the default config directory
    pub fn config_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Failed to get home directory")?;
        Ok(home.join(".cropadvisor"))
    }

    /// Get the default config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Load config from file, or return defaults when the file is absent
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {:?}", path))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file {:?}", path))
        } else {
            debug!("Config file {:?} not found, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Load from `path` (or the default location), then apply environment
    /// overrides and validate.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::load(p)?,
            None => match Self::config_path() {
                Ok(p) => Self::load(&p)?,
                Err(e) => {
                    debug!("No default config location: {}", e);
                    Self::default()
                }
            },
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from environment-style lookups
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(port) = get("PORT") {
            self.port = port
                .parse()
                .with_context(|| format!("Invalid PORT value: {}", port))?;
        }
        if let Some(addr) = get("BIND_ADDRESS") {
            self.bind_address = addr;
        }
        if let Some(key) = get("GEMINI_API_KEY") {
            self.gemini_api_key = Some(key);
        }
        if let Some(url) = get("GEMINI_BASE_URL") {
            self.gemini_base_url = url;
        }
        if let Some(model) = get("GEMINI_TEXT_MODEL") {
            self.text_model = model;
        }
        if let Some(model) = get("GEMINI_VISION_MODEL") {
            self.vision_model = model;
        }
        if let Some(secs) = get("MODEL_TIMEOUT_SECS") {
            self.request_timeout_secs = secs
                .parse()
                .with_context(|| format!("Invalid MODEL_TIMEOUT_SECS value: {}", secs))?;
        }
        if let Some(flag) = get("REQUIRE_ALL_FIELDS") {
            self.require_all_fields = matches!(flag.to_lowercase().as_str(), "1" | "true" | "yes");
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be greater than zero");
        }
        if self.max_image_bytes == 0 {
            bail!("max_image_bytes must be greater than zero");
        }
        if self.text_model.trim().is_empty() || self.vision_model.trim().is_empty() {
            bail!("Gemini model names cannot be empty");
        }
        Ok(())
    }

    /// The API key, or an error explaining how to provide one
    pub fn require_api_key(&self) -> Result<&str> {
        match self.gemini_api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => Ok(key),
            _ => bail!("GEMINI_API_KEY is not set in environment variables"),
        }
    }
}
