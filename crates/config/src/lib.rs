//! Configuration loading, validation, and management for ACE.
//!
//! Loads configuration from `~/.ace/config.toml` with environment
//! variable overrides. Validates all settings before anything uses them.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.ace/config.toml`.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AceConfig {
    /// API key for prompted roles (read by the caller's provider client)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Context engine policy
    #[serde(default)]
    pub engine: EngineConfig,

    /// Role implementation settings
    #[serde(default)]
    pub roles: RolesConfig,
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AceConfig")
            .field("api_key", &redact(&self.api_key))
            .field("engine", &self.engine)
            .field("roles", &self.roles)
            .finish()
    }
}

/// Knobs for the context engine's bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Refine runs when the item count exceeds this
    #[serde(default = "default_refine_threshold")]
    pub refine_threshold: usize,

    /// Refine keeps at least this many items (capped by the threshold)
    #[serde(default = "default_refine_floor")]
    pub refine_floor: usize,

    /// EMA rate for effectiveness feedback
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,

    /// Strategies returned per generate call
    #[serde(default = "default_max_strategies")]
    pub max_strategies: usize,

    /// Top-ranked items passed to the strategist (all when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_limit: Option<usize>,

    #[serde(default = "default_event_log_capacity")]
    pub event_log_capacity: usize,

    /// Event-log entries included in a state summary
    #[serde(default = "default_summary_events")]
    pub summary_events: usize,

    /// Share of existing ids a curator must drop before the anomaly is
    /// flagged as a full rewrite
    #[serde(default = "default_rewrite_ratio")]
    pub rewrite_ratio: f64,
}

fn default_refine_threshold() -> usize {
    20
}
fn default_refine_floor() -> usize {
    10
}
fn default_learning_rate() -> f64 {
    0.2
}
fn default_max_strategies() -> usize {
    5
}
fn default_event_log_capacity() -> usize {
    100
}
fn default_summary_events() -> usize {
    10
}
fn default_rewrite_ratio() -> f64 {
    0.5
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            refine_threshold: default_refine_threshold(),
            refine_floor: default_refine_floor(),
            learning_rate: default_learning_rate(),
            max_strategies: default_max_strategies(),
            context_limit: None,
            event_log_capacity: default_event_log_capacity(),
            summary_events: default_summary_events(),
            rewrite_ratio: default_rewrite_ratio(),
        }
    }
}

impl EngineConfig {
    /// Builder: set the refine threshold.
    pub fn with_refine_threshold(mut self, threshold: usize) -> Self {
        self.refine_threshold = threshold;
        self
    }

    /// Builder: set the EMA learning rate.
    pub fn with_learning_rate(mut self, rate: f64) -> Self {
        self.learning_rate = rate;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.refine_threshold == 0 {
            return Err(ConfigError::ValidationError(
                "engine.refine_threshold must be at least 1".into(),
            ));
        }
        if self.refine_floor == 0 {
            return Err(ConfigError::ValidationError(
                "engine.refine_floor must be at least 1".into(),
            ));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return Err(ConfigError::ValidationError(
                "engine.learning_rate must be in (0.0, 1.0]".into(),
            ));
        }
        if self.max_strategies == 0 {
            return Err(ConfigError::ValidationError(
                "engine.max_strategies must be at least 1".into(),
            ));
        }
        if self.context_limit == Some(0) {
            return Err(ConfigError::ValidationError(
                "engine.context_limit must be at least 1 when set".into(),
            ));
        }
        if self.event_log_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "engine.event_log_capacity must be at least 1".into(),
            ));
        }
        if !(self.rewrite_ratio > 0.0 && self.rewrite_ratio <= 1.0) {
            return Err(ConfigError::ValidationError(
                "engine.rewrite_ratio must be in (0.0, 1.0]".into(),
            ));
        }
        Ok(())
    }
}

/// Settings shared by the bundled role implementations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RolesConfig {
    /// Model name sent to the provider
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_generate_temperature")]
    pub generate_temperature: f32,

    #[serde(default = "default_reflect_temperature")]
    pub reflect_temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Attempts per role call, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Per-attempt timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Base delay between attempts, doubled each retry
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,

    #[serde(default)]
    pub curator: CuratorConfig,
}

fn default_model() -> String {
    "deepseek-chat".into()
}
fn default_generate_temperature() -> f32 {
    0.7
}
fn default_reflect_temperature() -> f32 {
    0.5
}
fn default_max_tokens() -> u32 {
    1500
}
fn default_max_attempts() -> u32 {
    3
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_backoff_ms() -> u64 {
    250
}

impl Default for RolesConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            generate_temperature: default_generate_temperature(),
            reflect_temperature: default_reflect_temperature(),
            max_tokens: default_max_tokens(),
            max_attempts: default_max_attempts(),
            timeout_secs: default_timeout_secs(),
            backoff_ms: default_backoff_ms(),
            curator: CuratorConfig::default(),
        }
    }
}

/// Scores the delta curator assigns when it creates or reinforces items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CuratorConfig {
    #[serde(default = "default_insight_priority")]
    pub insight_priority: f64,

    #[serde(default = "default_strategy_priority")]
    pub strategy_priority: f64,

    #[serde(default = "default_pattern_priority")]
    pub pattern_priority: f64,

    #[serde(default = "default_failure_priority")]
    pub failure_priority: f64,

    /// Effectiveness taken off every existing item when a reflection reports failures
    #[serde(default = "default_failure_penalty")]
    pub failure_penalty: f64,

    /// Priority added to an item when a reflection repeats it
    #[serde(default = "default_reinforce_step")]
    pub reinforce_step: f64,
}

fn default_insight_priority() -> f64 {
    0.8
}
fn default_strategy_priority() -> f64 {
    0.7
}
fn default_pattern_priority() -> f64 {
    0.75
}
fn default_failure_priority() -> f64 {
    0.6
}
fn default_failure_penalty() -> f64 {
    0.025
}
fn default_reinforce_step() -> f64 {
    0.05
}

impl Default for CuratorConfig {
    fn default() -> Self {
        Self {
            insight_priority: default_insight_priority(),
            strategy_priority: default_strategy_priority(),
            pattern_priority: default_pattern_priority(),
            failure_priority: default_failure_priority(),
            failure_penalty: default_failure_penalty(),
            reinforce_step: default_reinforce_step(),
        }
    }
}

impl RolesConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, t) in [
            ("generate_temperature", self.generate_temperature),
            ("reflect_temperature", self.reflect_temperature),
        ] {
            if !(0.0..=2.0).contains(&t) {
                return Err(ConfigError::ValidationError(format!(
                    "roles.{name} must be between 0.0 and 2.0"
                )));
            }
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "roles.max_attempts must be at least 1".into(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "roles.timeout_secs must be at least 1".into(),
            ));
        }
        let c = &self.curator;
        for (name, p) in [
            ("insight_priority", c.insight_priority),
            ("strategy_priority", c.strategy_priority),
            ("pattern_priority", c.pattern_priority),
            ("failure_priority", c.failure_priority),
        ] {
            if !(p.is_finite() && p > 0.0) {
                return Err(ConfigError::ValidationError(format!(
                    "roles.curator.{name} must be a positive number"
                )));
            }
        }
        if !(0.0..=1.0).contains(&c.failure_penalty) {
            return Err(ConfigError::ValidationError(
                "roles.curator.failure_penalty must be between 0.0 and 1.0".into(),
            ));
        }
        if !(c.reinforce_step.is_finite() && c.reinforce_step >= 0.0) {
            return Err(ConfigError::ValidationError(
                "roles.curator.reinforce_step must be >= 0".into(),
            ));
        }
        Ok(())
    }
}

impl AceConfig {
    /// Load configuration from the default path (~/.ace/config.toml).
    ///
    /// Environment overrides (highest priority):
    /// - `ACE_API_KEY`
    /// - `ACE_MODEL`
    /// - `ACE_REFINE_THRESHOLD`
    /// - `ACE_LEARNING_RATE`
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_env(&Self::config_path())
    }

    /// Load from `path`, then apply environment overrides.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
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

    /// Apply overrides from a key lookup (the environment, in `load`).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("ACE_API_KEY") {
            self.api_key = Some(key);
        }
        if let Some(model) = lookup("ACE_MODEL") {
            self.roles.model = model;
        }
        if let Some(raw) = lookup("ACE_REFINE_THRESHOLD") {
            self.engine.refine_threshold = raw.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "ACE_REFINE_THRESHOLD must be a positive integer, got '{raw}'"
                ))
            })?;
        }
        if let Some(raw) = lookup("ACE_LEARNING_RATE") {
            self.engine.learning_rate = raw.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "ACE_LEARNING_RATE must be a number, got '{raw}'"
                ))
            })?;
        }
        self.validate()
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".ace")
    }

    /// Default config file location.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine.validate()?;
        self.roles.validate()
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
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

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
