//! Configuration loading, validation, and management for Palaver.
//!
//! Loads configuration from `~/.palaver/config.toml` with environment
//! variable overrides. Validates all settings at startup, and exposes the
//! same validation to the session so runtime changes obey identical rules.

use palaver_core::provider::SamplingParams;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.palaver/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Remote completion endpoint settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Model, sampling, budget and persona for new sessions
    #[serde(default)]
    pub session: SessionConfig,

    /// Topic gating applied before prompts reach the provider
    #[serde(default)]
    pub relevance: RelevanceConfig,
}

// --- Provider ---

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Label used in logs (e.g., "together", "openai")
    #[serde(default = "default_provider_name")]
    pub name: String,

    /// Base URL of an OpenAI-compatible API (without `/chat/completions`)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API key (can also come from the environment)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Upper bound on a single completion call
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_provider_name() -> String {
    "together".into()
}
fn default_base_url() -> String {
    "https://api.together.xyz/v1".into()
}
fn default_request_timeout_secs() -> u64 {
    60
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: default_provider_name(),
            base_url: default_base_url(),
            api_key: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("name", &self.name)
            .field("base_url", &self.base_url)
            .field("api_key", &redact(&self.api_key))
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

// --- Session ---

pub const DEFAULT_MODEL: &str = "meta-llama/Llama-Vision-Free";
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_TOP_P: f64 = 1.0;
pub const DEFAULT_MAX_TOKENS: u32 = 512;
pub const DEFAULT_TOKEN_BUDGET: usize = 4096;
pub const DEFAULT_SYSTEM_PROMPT: &str = concat!(
    "You are a friendly and supportive guide. You answer questions with kindness, ",
    "encouragement, and patience, always looking to help the user feel comfortable ",
    "and confident.",
);

/// Settings owned by one conversation session.
///
/// Every field may change between submissions; changing `system_prompt`
/// discards the session's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature, 0.0–1.0. `0.0` is a real setting, not "unset".
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// Nucleus sampling probability, 0.0–1.0
    #[serde(default = "default_top_p")]
    pub top_p: f64,

    /// Maximum tokens per reply (≥ 1)
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Maximum tokens the transcript may occupy (≥ 1)
    #[serde(default = "default_token_budget")]
    pub token_budget: usize,

    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

fn default_model() -> String {
    DEFAULT_MODEL.into()
}
fn default_temperature() -> f64 {
    DEFAULT_TEMPERATURE
}
fn default_top_p() -> f64 {
    DEFAULT_TOP_P
}
fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}
fn default_token_budget() -> usize {
    DEFAULT_TOKEN_BUDGET
}
fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.into()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            max_tokens: default_max_tokens(),
            token_budget: default_token_budget(),
            system_prompt: default_system_prompt(),
        }
    }
}

impl SessionConfig {
    /// Check every field against its legal range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_model(&self.model)?;
        validate_unit_interval("temperature", self.temperature)?;
        validate_unit_interval("top_p", self.top_p)?;
        validate_positive("max_tokens", u64::from(self.max_tokens))?;
        validate_positive("token_budget", self.token_budget as u64)?;
        Ok(())
    }

    /// The parameters forwarded to the provider with each request.
    pub fn sampling(&self) -> SamplingParams {
        SamplingParams {
            model: self.model.clone(),
            temperature: self.temperature,
            top_p: self.top_p,
            max_tokens: self.max_tokens,
        }
    }
}

/// Reject blank model identifiers.
pub fn validate_model(model: &str) -> Result<(), ConfigError> {
    if model.trim().is_empty() {
        return Err(ConfigError::ValidationError("model must not be empty".into()));
    }
    Ok(())
}

/// Reject values outside `[0.0, 1.0]` (NaN included).
pub fn validate_unit_interval(field: &str, value: f64) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::ValidationError(format!(
            "{field} must be between 0.0 and 1.0 (got {value})"
        )));
    }
    Ok(())
}

/// Reject zero for settings that must be positive.
pub fn validate_positive(field: &str, value: u64) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::ValidationError(format!(
            "{field} must be a positive integer"
        )));
    }
    Ok(())
}

// --- Relevance ---

pub const DEFAULT_REFUSAL_MESSAGE: &str = concat!(
    "I'm sorry, I can only help with questions about careers, job searching, ",
    "resumes, and interviews.",
);

/// Keyword-based topic gating.
///
/// `keywords` maps a language tag to the words and phrases that mark a
/// prompt as on-topic. Adding a language means adding one more entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelevanceConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Reply recorded and returned when a prompt is rejected
    #[serde(default = "default_refusal_message")]
    pub refusal_message: String,

    #[serde(default = "default_keywords")]
    pub keywords: BTreeMap<String, Vec<String>>,
}

fn default_refusal_message() -> String {
    DEFAULT_REFUSAL_MESSAGE.into()
}

fn default_keywords() -> BTreeMap<String, Vec<String>> {
    let english = [
        "resume", "résumé", "cv", "cover letter", "interview", "job", "jobs", "career",
        "careers", "salary", "hiring", "recruiter", "linkedin", "internship", "promotion",
        "portfolio", "employer", "application", "skills", "work experience",
    ];
    let spanish = [
        "currículum", "curriculum", "cv", "carta de presentación", "entrevista", "empleo",
        "trabajo", "carrera", "salario", "sueldo", "contratación", "reclutador", "prácticas",
        "ascenso", "portafolio", "habilidades", "experiencia laboral",
    ];

    let mut map = BTreeMap::new();
    map.insert(
        "english".to_string(),
        english.iter().map(|s| s.to_string()).collect(),
    );
    map.insert(
        "spanish".to_string(),
        spanish.iter().map(|s| s.to_string()).collect(),
    );
    map
}

impl Default for RelevanceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            refusal_message: default_refusal_message(),
            keywords: default_keywords(),
        }
    }
}

impl RelevanceConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !self.enabled {
            return Ok(());
        }
        if self.refusal_message.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "relevance.refusal_message must not be empty".into(),
            ));
        }
        if self.keywords.is_empty() {
            return Err(ConfigError::ValidationError(
                "relevance.keywords needs at least one language".into(),
            ));
        }
        for (language, words) in &self.keywords {
            if words.iter().all(|w| w.trim().is_empty()) {
                return Err(ConfigError::ValidationError(format!(
                    "relevance.keywords.{language} has no keywords"
                )));
            }
        }
        Ok(())
    }
}

// --- Loading ---

impl AppConfig {
    /// Load configuration from the default path (~/.palaver/config.toml).
    ///
    /// Also checks environment variables:
    /// - `PALAVER_API_KEY`, then `TOGETHER_API_KEY`, then `OPENAI_API_KEY`
    ///   (only when the file sets no key)
    /// - `PALAVER_BASE_URL`
    /// - `PALAVER_MODEL`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through `lookup` (normally `std::env::var`).
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.provider.api_key.is_none() {
            self.provider.api_key = lookup("PALAVER_API_KEY")
                .or_else(|| lookup("TOGETHER_API_KEY"))
                .or_else(|| lookup("OPENAI_API_KEY"));
        }

        if let Some(url) = lookup("PALAVER_BASE_URL") {
            self.provider.base_url = url;
        }

        if let Some(model) = lookup("PALAVER_MODEL") {
            self.session.model = model;
        }
    }

    /// Write this configuration as TOML, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |reason: String| ConfigError::WriteError {
            path: path.to_path_buf(),
            reason,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| write_err(e.to_string()))?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| write_err(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| write_err(e.to_string()))
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".palaver")
    }

    /// Get the configuration file path.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.provider.base_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "provider.base_url must not be empty".into(),
            ));
        }
        validate_positive("provider.request_timeout_secs", self.provider.request_timeout_secs)?;
        self.session.validate()?;
        self.relevance.validate()?;
        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.provider.api_key.is_some()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Failed to write config file at {path}: {reason}")]
    WriteError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
