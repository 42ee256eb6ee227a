//! Integration tests for the Storyloom story pipeline

mod cli_commands;
mod config_integration;
mod pipeline_scenarios;
mod request_boundary;

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use storyloom::error::ProviderFailure;
use storyloom::provider::{CompletionRequest, CompletionResponse, TextGenerator, TokenUsage};

/// `n` filler words.
pub fn words(n: usize) -> String {
    vec!["word"; n].join(" ")
}

/// A story of exactly `total_words` body words: title, two paragraphs,
/// mentions `name` once, no dialogue.
pub fn story_for(name: &str, total_words: usize) -> String {
    let first = total_words / 2;
    format!(
        "TITLE: {} and the Sleepy Owl\n\n{} {}\n\n{}\n\nWORD COUNT: {}",
        name,
        name,
        words(first - 1),
        words(total_words - first),
        total_words
    )
}

/// Replies queued up front; records every request it sees.
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<Result<String, ProviderFailure>>>,
    delay: Duration,
    pub requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedGenerator {
    pub fn new(replies: Vec<Result<String, ProviderFailure>>) -> Arc<Self> {
        Self::with_delay(replies, Duration::ZERO)
    }

    pub fn with_delay(replies: Vec<Result<String, ProviderFailure>>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            delay,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn user_prompts(&self) -> Vec<String> {
        self.requests
            .lock()
            .iter()
            .filter_map(|r| r.messages.last().map(|m| m.content.clone()))
            .collect()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, ProviderFailure> {
        self.requests.lock().push(request.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let reply = self
            .replies
            .lock()
            .pop_front()
            .unwrap_or(Err(ProviderFailure::Network("no reply queued".to_string())));
        reply.map(|content| CompletionResponse {
            content,
            model: request.model,
            usage: TokenUsage::default(),
            finish_reason: Some("stop".to_string()),
        })
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }
}

/// Serializes tests that touch process environment variables.
pub static ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

/// Sets environment variables for one test and restores them on drop.
pub struct EnvGuard {
    saved: Vec<(String, Option<String>)>,
}

impl EnvGuard {
    pub fn set(vars: &[(&str, &str)]) -> Self {
        let saved = vars
            .iter()
            .map(|(key, value)| {
                let previous = std::env::var(key).ok();
                std::env::set_var(key, value);
                (key.to_string(), previous)
            })
            .collect();
        Self { saved }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, previous) in &self.saved {
            match previous {
                Some(value) => std::env::set_var(key, value),
                None => std::env::remove_var(key),
            }
        }
    }
}
