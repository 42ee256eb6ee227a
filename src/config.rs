//! Configuration System
//!
//! Layered configuration for the story pipeline: built-in defaults, the user's
//! global config file, workspace config files, then `STORYLOOM__*` environment
//! overrides. Every section carries serde defaults so an empty file is valid.

use crate::error::StoryError;
use crate::invoker::{ModelSelection, DEFAULT_MAX_OUTPUT_TOKENS};
use crate::logging::LoggingConfig;
use crate::policy::{PolicyOverrides, PolicyTable};
use crate::provider::ProviderConfig;
use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::fmt;

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoryloomConfig {
    /// Text provider connection
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Baseline / advanced model ids
    #[serde(default)]
    pub models: ModelSelection,

    /// Generation and retry settings
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Length / content table overrides
    #[serde(default)]
    pub policy: PolicyOverrides,

    /// Cover illustration settings
    #[serde(default)]
    pub illustration: IllustrationConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Per-attempt provider timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Provider ceiling for `max_tokens`
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    #[serde(default)]
    pub retry: RetryPolicy,

    /// Fixed seed for placeholder-name selection; random when unset
    #[serde(default)]
    pub seed: Option<u64>,

    /// Replaces the built-in system instruction
    #[serde(default)]
    pub system_instruction: Option<String>,
}

fn default_temperature() -> f32 {
    0.8
}

fn default_timeout_secs() -> u64 {
    45
}

fn default_max_output_tokens() -> u32 {
    DEFAULT_MAX_OUTPUT_TOKENS
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
            max_output_tokens: default_max_output_tokens(),
            retry: RetryPolicy::default(),
            seed: None,
            system_instruction: None,
        }
    }
}

impl GenerationConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(format!(
                "temperature must be between 0.0 and 2.0 (got {})",
                self.temperature
            ));
        }
        if self.timeout_secs == 0 {
            return Err("timeout_secs must be greater than zero".to_string());
        }
        if self.max_output_tokens == 0 {
            return Err("max_output_tokens must be greater than zero".to_string());
        }
        self.retry.validate()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IllustrationConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_image_model")]
    pub model: String,

    #[serde(default = "default_image_size")]
    pub size: String,

    #[serde(default = "default_illustration_timeout_secs")]
    pub timeout_secs: u64,

    /// Separate image provider; the text provider's credentials are used when unset
    #[serde(default)]
    pub provider: Option<ProviderConfig>,
}

fn default_image_model() -> String {
    "dall-e-3".to_string()
}

fn default_image_size() -> String {
    "1024x1024".to_string()
}

fn default_illustration_timeout_secs() -> u64 {
    60
}

impl Default for IllustrationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            model: default_image_model(),
            size: default_image_size(),
            timeout_secs: default_illustration_timeout_secs(),
            provider: None,
        }
    }
}

impl IllustrationConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("model cannot be empty".to_string());
        }
        if self.timeout_secs == 0 {
            return Err("timeout_secs must be greater than zero".to_string());
        }
        if let Some(provider) = &self.provider {
            provider.validate()?;
        }
        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Provider(String),
    Models(String),
    Generation(String),
    Policy(String),
    Illustration(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Provider(msg) => write!(f, "provider: {}", msg),
            ValidationError::Models(msg) => write!(f, "models: {}", msg),
            ValidationError::Generation(msg) => write!(f, "generation: {}", msg),
            ValidationError::Policy(msg) => write!(f, "policy: {}", msg),
            ValidationError::Illustration(msg) => write!(f, "illustration: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl StoryloomConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.provider.validate() {
            errors.push(ValidationError::Provider(e));
        }
        if let Err(e) = self.models.validate() {
            errors.push(ValidationError::Models(e));
        }
        if let Err(e) = self.generation.validate() {
            errors.push(ValidationError::Generation(e));
        }
        if let Err(e) = self.policy_table() {
            errors.push(ValidationError::Policy(e.to_string()));
        }
        if let Err(e) = self.illustration.validate() {
            errors.push(ValidationError::Illustration(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate, folding every problem into one `ConfigError`.
    pub fn ensure_valid(&self) -> Result<(), StoryError> {
        self.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            StoryError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })
    }

    /// The standard policy table with this config's overrides applied.
    pub fn policy_table(&self) -> Result<PolicyTable, StoryError> {
        PolicyTable::standard(self.generation.max_output_tokens)
            .with_overrides(&self.policy, self.generation.max_output_tokens)
    }
}
