//! Story Illustrations
//!
//! Best-effort cover art for a finished story. Runs only after the text is
//! done; any failure here is logged and dropped, never returned.

use crate::error::ProviderFailure;
use crate::prompt::join_themes;
use crate::provider::{build_provider_http_client, failure_from_response, map_http_error};
use crate::request::GenerationRequest;
use crate::shaping::GenerationResult;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Image generation client trait
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Generate one image and return its URL (or data URI).
    async fn generate(&self, prompt: &str) -> Result<String, ProviderFailure>;

    fn model_name(&self) -> &str;
}

/// A generated cover image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Illustration {
    pub image_url: String,
    pub prompt: String,
    pub model: String,
}

/// OpenAI images API client
pub struct OpenAIImageClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    size: String,
    connect_timeout: Duration,
}

impl OpenAIImageClient {
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        model: String,
        size: String,
        connect_timeout: Duration,
    ) -> Result<Self, ProviderFailure> {
        Ok(Self {
            client: build_provider_http_client(connect_timeout)?,
            api_key,
            base_url: base_url
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string())
                .trim_end_matches('/')
                .to_string(),
            model,
            size,
            connect_timeout,
        })
    }
}

#[derive(Deserialize)]
struct ImagesResponse {
    data: Vec<ImageData>,
}

#[derive(Deserialize)]
struct ImageData {
    url: Option<String>,
    b64_json: Option<String>,
}

#[async_trait]
impl ImageGenerator for OpenAIImageClient {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderFailure> {
        let url = format!("{}/images/generations", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.model,
                "prompt": prompt,
                "n": 1,
                "size": self.size,
            }))
            .send()
            .await
            .map_err(|e| map_http_error(e, self.connect_timeout))?;

        if !response.status().is_success() {
            return Err(failure_from_response(response).await);
        }

        let parsed: ImagesResponse = response
            .json()
            .await
            .map_err(|e| ProviderFailure::MalformedResponse(format!("Failed to parse image response: {}", e)))?;

        let image = parsed
            .data
            .into_iter()
            .next()
            .ok_or(ProviderFailure::EmptyResponse)?;

        match (image.url, image.b64_json) {
            (Some(url), _) if !url.is_empty() => Ok(url),
            (_, Some(b64)) if !b64.is_empty() => Ok(format!("data:image/png;base64,{}", b64)),
            _ => Err(ProviderFailure::EmptyResponse),
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Child-friendly cover prompt built from the story's title and themes.
pub fn illustration_prompt(result: &GenerationResult, request: &GenerationRequest) -> String {
    format!(
        "A warm, colorful children's picture-book illustration for a story titled \"{}\", \
         featuring {} and themes of {}. Soft lighting, friendly expressions, no text or lettering.",
        result.title,
        result.character_name,
        join_themes(request.themes())
    )
}

pub struct Illustrator {
    generator: Arc<dyn ImageGenerator>,
    timeout: Duration,
}

impl Illustrator {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    pub fn new(generator: Arc<dyn ImageGenerator>) -> Self {
        Self {
            generator,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn illustrate(
        &self,
        result: &GenerationResult,
        request: &GenerationRequest,
    ) -> Option<Illustration> {
        let prompt = illustration_prompt(result, request);
        let outcome = tokio::time::timeout(self.timeout, self.generator.generate(&prompt))
            .await
            .unwrap_or(Err(ProviderFailure::Timeout(self.timeout.as_secs())));

        match outcome {
            Ok(image_url) => {
                info!(model = self.generator.model_name(), "Story illustration generated");
                Some(Illustration {
                    image_url,
                    prompt,
                    model: self.generator.model_name().to_string(),
                })
            }
            Err(error) => {
                warn!(error = %error, "Story illustration skipped");
                None
            }
        }
    }
}
