//! Story service: the end-to-end pipeline for one request.
//! Looks up policies, resolves the hero's name, picks the model, runs the retry
//! loop and shapes the winner. Holds only immutable state, so one service can
//! serve concurrent requests.

use crate::config::StoryloomConfig;
use crate::error::StoryError;
use crate::illustration::{Illustration, Illustrator, OpenAIImageClient};
use crate::invoker::{ModelInvoker, ModelSelection};
use crate::policy::PolicyTable;
use crate::prompt::{resolve_character_name, PromptBuilder};
use crate::provider::{ProviderFactory, TextGenerator};
use crate::request::{GenerationRequest, StoryRequestPayload};
use crate::retry::{GenerationAttempt, RetryController, RetryPolicy, StoryJob};
use crate::scoring::{self, ScoreBreakdown};
use crate::shaping::{shape, GenerationResult};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// A story plus its optional cover art
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IllustratedStory {
    pub story: GenerationResult,
    pub illustration: Option<Illustration>,
}

pub struct StoryService {
    policies: PolicyTable,
    prompts: PromptBuilder,
    invoker: ModelInvoker,
    models: ModelSelection,
    retry: RetryPolicy,
    illustrator: Option<Illustrator>,
    seed: Option<u64>,
}

impl StoryService {
    /// Service with built-in policies and defaults around an existing text client.
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            policies: PolicyTable::default(),
            prompts: PromptBuilder::default(),
            invoker: ModelInvoker::new(generator),
            models: ModelSelection::default(),
            retry: RetryPolicy::default(),
            illustrator: None,
            seed: None,
        }
    }

    /// Build the full service from validated configuration.
    pub fn from_config(config: &StoryloomConfig) -> Result<Self, StoryError> {
        config.ensure_valid()?;

        let generator: Arc<dyn TextGenerator> = ProviderFactory::create_client(&config.provider)
            .map_err(|e| StoryError::ConfigError(format!("text provider: {}", e)))?
            .into();
        let generation = &config.generation;
        let invoker = ModelInvoker::new(generator)
            .with_temperature(generation.temperature)
            .with_timeout(Duration::from_secs(generation.timeout_secs))
            .with_max_output_tokens(generation.max_output_tokens);
        let prompts = match &generation.system_instruction {
            Some(instruction) => PromptBuilder::with_system_instruction(instruction.clone()),
            None => PromptBuilder::default(),
        };

        Ok(Self {
            policies: config.policy_table()?,
            prompts,
            invoker,
            models: config.models.clone(),
            retry: generation.retry,
            illustrator: build_illustrator(config),
            seed: generation.seed,
        })
    }

    pub fn with_policies(mut self, policies: PolicyTable) -> Self {
        self.policies = policies;
        self
    }

    pub fn with_models(mut self, models: ModelSelection) -> Self {
        self.models = models;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_prompt_builder(mut self, prompts: PromptBuilder) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn with_illustrator(mut self, illustrator: Illustrator) -> Self {
        self.illustrator = Some(illustrator);
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn policies(&self) -> &PolicyTable {
        &self.policies
    }

    pub fn has_illustrator(&self) -> bool {
        self.illustrator.is_some()
    }

    /// The hero's name as this service would resolve it for `request`.
    pub fn character_name_for(&self, request: &GenerationRequest) -> String {
        resolve_character_name(request, &mut request_rng(self.seed))
    }

    pub async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult, StoryError> {
        let length = self.policies.lookup_length_policy(request.length_tier())?;
        let content = self.policies.lookup_content_policy(request.age_band())?;
        let character_name = self.character_name_for(request);
        let model_id = self.models.select_model(request.age_band(), request.length_tier());

        info!(
            age_band = %request.age_band(),
            length_tier = %request.length_tier(),
            model = model_id,
            provider = self.invoker.provider_name(),
            target_words = length.target_words,
            "Generating story"
        );

        let controller = RetryController::new(self.retry, &self.prompts, &self.invoker);
        let report = controller
            .run(StoryJob {
                request,
                length,
                content,
                character_name: &character_name,
                model_id,
            })
            .await?;

        let result = shape(
            &report.best,
            model_id,
            report.attempts_used,
            &character_name,
            &length.reading_time_label,
        );

        if result.meets_threshold(self.retry.satisfaction_threshold) {
            info!(
                score = result.quality_score,
                attempts = result.attempts_used,
                word_count = result.word_count,
                "Story generated"
            );
        } else {
            warn!(
                score = result.quality_score,
                threshold = self.retry.satisfaction_threshold,
                attempts = result.attempts_used,
                "Returning best story below quality threshold"
            );
        }
        Ok(result)
    }

    /// Validate an inbound payload, then generate.
    pub async fn generate_from_payload(
        &self,
        payload: StoryRequestPayload,
    ) -> Result<GenerationResult, StoryError> {
        let request = GenerationRequest::try_from(payload)?;
        self.generate(&request).await
    }

    /// Generate, then add cover art when an illustrator is configured. Art
    /// failures never fail the story.
    pub async fn generate_illustrated(
        &self,
        request: &GenerationRequest,
    ) -> Result<IllustratedStory, StoryError> {
        let story = self.generate(request).await?;
        let illustration = match &self.illustrator {
            Some(illustrator) => illustrator.illustrate(&story, request).await,
            None => None,
        };
        Ok(IllustratedStory {
            story,
            illustration,
        })
    }

    /// Score an existing story offline with this service's policies.
    pub fn evaluate(
        &self,
        request: &GenerationRequest,
        raw_text: &str,
        character_name: &str,
    ) -> Result<(GenerationAttempt, ScoreBreakdown), StoryError> {
        evaluate_story(&self.policies, request, raw_text, character_name)
    }
}

/// Fresh RNG for one request: seeded when a seed is configured.
pub fn request_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Score an existing story offline against `request`'s length policy.
pub fn evaluate_story(
    policies: &PolicyTable,
    request: &GenerationRequest,
    raw_text: &str,
    character_name: &str,
) -> Result<(GenerationAttempt, ScoreBreakdown), StoryError> {
    let length = policies.lookup_length_policy(request.length_tier())?;
    let attempt = GenerationAttempt::grade(1, raw_text.to_string(), length, character_name);
    let breakdown = scoring::breakdown(&attempt, length, character_name);
    Ok((attempt, breakdown))
}

/// Illustration is optional; a missing key disables it with a warning.
fn build_illustrator(config: &StoryloomConfig) -> Option<Illustrator> {
    let settings = &config.illustration;
    if !settings.enabled {
        return None;
    }

    let provider = settings.provider.as_ref().unwrap_or(&config.provider);
    let Some(api_key) = provider.resolve_api_key() else {
        warn!("Illustration enabled but no API key is configured; skipping illustrations");
        return None;
    };

    match OpenAIImageClient::new(
        api_key,
        provider.endpoint.clone(),
        settings.model.clone(),
        settings.size.clone(),
        Duration::from_secs(provider.connect_timeout_secs),
    ) {
        Ok(client) => Some(
            Illustrator::new(Arc::new(client))
                .with_timeout(Duration::from_secs(settings.timeout_secs)),
        ),
        Err(e) => {
            warn!(error = %e, "Failed to build image client; skipping illustrations");
            None
        }
    }
}
