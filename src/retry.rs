//! Retry Controller
//!
//! Runs up to `max_attempts` sequential generation attempts for one request and
//! keeps the best-scoring one. States:
//!
//! ```text
//! Attempting -> Scoring -> Satisfied
//!     ^            |
//!     +- Retrying <+        (provider failure also leads to Retrying)
//! ```
//!
//! The run ends in `Satisfied` once an attempt reaches the threshold or the
//! attempt cap is hit with at least one scored attempt; it ends in `Terminal`
//! only when every attempt failed at the provider.

use crate::error::{ProviderFailure, StoryError};
use crate::invoker::ModelInvoker;
use crate::policy::{ContentPolicy, LengthPolicy};
use crate::prompt::PromptBuilder;
use crate::request::GenerationRequest;
use crate::scoring;
use crate::shaping::extract;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Never more than this many attempts per request.
pub const MAX_ATTEMPTS_CAP: u32 = 3;

/// Attempt cap and the score that ends the loop early
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_satisfaction_threshold")]
    pub satisfaction_threshold: u8,
}

fn default_max_attempts() -> u32 {
    MAX_ATTEMPTS_CAP
}

fn default_satisfaction_threshold() -> u8 {
    85
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            satisfaction_threshold: default_satisfaction_threshold(),
        }
    }
}

impl RetryPolicy {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 || self.max_attempts > MAX_ATTEMPTS_CAP {
            return Err(format!(
                "max_attempts must be between 1 and {} (got {})",
                MAX_ATTEMPTS_CAP, self.max_attempts
            ));
        }
        if self.satisfaction_threshold > 100 {
            return Err(format!(
                "satisfaction_threshold must be at most 100 (got {})",
                self.satisfaction_threshold
            ));
        }
        Ok(())
    }

    fn attempt_cap(&self) -> u32 {
        self.max_attempts.clamp(1, MAX_ATTEMPTS_CAP)
    }
}

/// One scored candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationAttempt {
    pub attempt_number: u32,
    pub raw_text: String,
    pub extracted_title: String,
    pub extracted_body: String,
    pub word_count: u32,
    pub quality_score: u8,
}

impl GenerationAttempt {
    /// Extract and score raw model output.
    pub fn grade(
        attempt_number: u32,
        raw_text: String,
        length: &LengthPolicy,
        character_name: &str,
    ) -> Self {
        let story = extract(&raw_text);
        let mut attempt = Self {
            attempt_number,
            raw_text,
            extracted_title: story.title,
            extracted_body: story.body,
            word_count: story.word_count,
            quality_score: 0,
        };
        attempt.quality_score = scoring::score(&attempt, length, character_name);
        attempt
    }
}

/// What happened on one attempt
#[derive(Debug)]
pub enum AttemptOutcome {
    Scored(GenerationAttempt),
    Failed {
        attempt_number: u32,
        error: StoryError,
    },
}

impl AttemptOutcome {
    pub fn attempt_number(&self) -> u32 {
        match self {
            AttemptOutcome::Scored(attempt) => attempt.attempt_number,
            AttemptOutcome::Failed { attempt_number, .. } => *attempt_number,
        }
    }

    pub fn scored(&self) -> Option<&GenerationAttempt> {
        match self {
            AttemptOutcome::Scored(attempt) => Some(attempt),
            AttemptOutcome::Failed { .. } => None,
        }
    }
}

#[derive(Debug)]
enum RetryState {
    Attempting { attempt_number: u32 },
    Scoring { attempt_number: u32, raw_text: String },
    Retrying { attempt_number: u32 },
    Satisfied { best: GenerationAttempt },
    Terminal(StoryError),
}

/// Everything one request's attempts share
#[derive(Debug, Clone, Copy)]
pub struct StoryJob<'a> {
    pub request: &'a GenerationRequest,
    pub length: &'a LengthPolicy,
    pub content: &'a ContentPolicy,
    pub character_name: &'a str,
    pub model_id: &'a str,
}

/// Result of a completed run
#[derive(Debug)]
pub struct RetryReport {
    pub best: GenerationAttempt,
    pub attempts_used: u32,
    pub outcomes: Vec<AttemptOutcome>,
}

pub struct RetryController<'a> {
    policy: RetryPolicy,
    prompts: &'a PromptBuilder,
    invoker: &'a ModelInvoker,
}

impl<'a> RetryController<'a> {
    pub fn new(policy: RetryPolicy, prompts: &'a PromptBuilder, invoker: &'a ModelInvoker) -> Self {
        Self {
            policy,
            prompts,
            invoker,
        }
    }

    pub async fn run(&self, job: StoryJob<'_>) -> Result<RetryReport, StoryError> {
        let mut outcomes: Vec<AttemptOutcome> = Vec::new();
        let mut state = RetryState::Attempting { attempt_number: 1 };

        loop {
            state = match state {
                RetryState::Attempting { attempt_number } => {
                    let prompt = self.prompts.build(
                        job.request,
                        job.length,
                        job.content,
                        job.character_name,
                        attempt_number,
                    );
                    match self
                        .invoker
                        .invoke(&prompt, job.length.token_budget, job.model_id)
                        .await
                    {
                        Ok(raw_text) => RetryState::Scoring {
                            attempt_number,
                            raw_text,
                        },
                        Err(error) => {
                            warn!(attempt = attempt_number, error = %error, "Generation attempt failed");
                            outcomes.push(AttemptOutcome::Failed {
                                attempt_number,
                                error,
                            });
                            self.after_attempt(attempt_number, false, &mut outcomes)
                        }
                    }
                }
                RetryState::Scoring {
                    attempt_number,
                    raw_text,
                } => {
                    let attempt = GenerationAttempt::grade(
                        attempt_number,
                        raw_text,
                        job.length,
                        job.character_name,
                    );
                    debug!(
                        attempt = attempt_number,
                        score = attempt.quality_score,
                        word_count = attempt.word_count,
                        target_words = job.length.target_words,
                        "Scored generation attempt"
                    );
                    let satisfied = attempt.quality_score >= self.policy.satisfaction_threshold;
                    outcomes.push(AttemptOutcome::Scored(attempt));
                    self.after_attempt(attempt_number, satisfied, &mut outcomes)
                }
                RetryState::Retrying { attempt_number } => {
                    info!(
                        next_attempt = attempt_number + 1,
                        "Retrying generation with escalated length instruction"
                    );
                    RetryState::Attempting {
                        attempt_number: attempt_number + 1,
                    }
                }
                RetryState::Satisfied { best } => {
                    let attempts_used = outcomes.len() as u32;
                    return Ok(RetryReport {
                        best,
                        attempts_used,
                        outcomes,
                    });
                }
                RetryState::Terminal(error) => return Err(error),
            };
        }
    }

    fn after_attempt(
        &self,
        attempt_number: u32,
        satisfied: bool,
        outcomes: &mut Vec<AttemptOutcome>,
    ) -> RetryState {
        if !satisfied && attempt_number < self.policy.attempt_cap() {
            return RetryState::Retrying { attempt_number };
        }
        match best_attempt(outcomes) {
            Some(best) => RetryState::Satisfied { best: best.clone() },
            None => RetryState::Terminal(take_last_error(outcomes)),
        }
    }
}

/// Highest score wins; the earliest attempt wins a tie.
pub fn best_attempt(outcomes: &[AttemptOutcome]) -> Option<&GenerationAttempt> {
    outcomes
        .iter()
        .filter_map(AttemptOutcome::scored)
        .fold(None, |best, candidate| match best {
            Some(current) if current.quality_score >= candidate.quality_score => Some(current),
            _ => Some(candidate),
        })
}

/// Only reached when no attempt scored, so every recorded outcome is a failure.
fn take_last_error(outcomes: &mut Vec<AttemptOutcome>) -> StoryError {
    match outcomes.pop() {
        Some(AttemptOutcome::Failed { error, .. }) => error,
        _ => StoryError::GenerationFailed(ProviderFailure::EmptyResponse),
    }
}
