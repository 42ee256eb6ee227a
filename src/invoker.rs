//! Model Invoker
//!
//! Executes one story prompt against the text provider under a timeout and
//! returns the raw text. Retrying is the retry controller's job, never this one.

use crate::error::{ProviderFailure, StoryError};
use crate::prompt::PromptText;
use crate::provider::{ChatMessage, CompletionRequest, TextGenerator};
use crate::request::{AgeBand, LengthTier};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Tokens per hundred words requested, covering tokenization overhead.
pub const WORD_TO_TOKEN_PERCENT: u32 = 140;

/// Hard ceiling on `max_tokens` accepted by the provider.
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 4096;

/// `ceil(target_words * 1.4)`, clamped to `ceiling`.
pub fn token_budget(target_words: u32, ceiling: u32) -> u32 {
    let scaled = (u64::from(target_words) * u64::from(WORD_TO_TOKEN_PERCENT)).div_ceil(100);
    scaled.min(u64::from(ceiling)) as u32
}

/// Baseline and higher-capability model ids
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSelection {
    #[serde(default = "default_baseline_model")]
    pub baseline: String,
    #[serde(default = "default_advanced_model")]
    pub advanced: String,
}

fn default_baseline_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_advanced_model() -> String {
    "gpt-4o".to_string()
}

impl Default for ModelSelection {
    fn default() -> Self {
        Self {
            baseline: default_baseline_model(),
            advanced: default_advanced_model(),
        }
    }
}

impl ModelSelection {
    /// Advanced model only for advanced readers asking for long stories.
    pub fn select_model(&self, age_band: AgeBand, length_tier: LengthTier) -> &str {
        if age_band.is_advanced() && length_tier.is_long() {
            &self.advanced
        } else {
            &self.baseline
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.baseline.trim().is_empty() {
            return Err("baseline model cannot be empty".to_string());
        }
        if self.advanced.trim().is_empty() {
            return Err("advanced model cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Invokes the text provider for a single attempt
pub struct ModelInvoker {
    generator: Arc<dyn TextGenerator>,
    temperature: f32,
    timeout: Duration,
    max_output_tokens: u32,
}

impl ModelInvoker {
    pub const DEFAULT_TEMPERATURE: f32 = 0.8;
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(45);

    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            temperature: Self::DEFAULT_TEMPERATURE,
            timeout: Self::DEFAULT_TIMEOUT,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }

    pub fn provider_name(&self) -> &str {
        self.generator.provider_name()
    }

    /// One round trip. Timeouts, transport errors, non-2xx and empty bodies
    /// all come back as `GenerationFailed`.
    pub async fn invoke(
        &self,
        prompt: &PromptText,
        token_budget: u32,
        model_id: &str,
    ) -> Result<String, StoryError> {
        let request = CompletionRequest {
            model: model_id.to_string(),
            messages: vec![
                ChatMessage::system(prompt.system.clone()),
                ChatMessage::user(prompt.user.clone()),
            ],
            max_tokens: token_budget.min(self.max_output_tokens),
            temperature: self.temperature,
        };

        debug!(
            provider = self.generator.provider_name(),
            model = model_id,
            max_tokens = request.max_tokens,
            "Invoking text provider"
        );

        let response = tokio::time::timeout(self.timeout, self.generator.complete(request))
            .await
            .map_err(|_| ProviderFailure::Timeout(self.timeout.as_secs()))??;

        if response.content.trim().is_empty() {
            return Err(ProviderFailure::EmptyResponse.into());
        }

        debug!(
            model = %response.model,
            completion_tokens = response.usage.completion_tokens,
            finish_reason = ?response.finish_reason,
            "Text provider responded"
        );
        Ok(response.content)
    }
}
