//! Length and Content Policy Tables
//!
//! Static mapping from length tier to word-count targets and from age band to
//! vocabulary and tone constraints. Tables are plain values handed to the
//! pipeline; lookups are pure.

use crate::error::StoryError;
use crate::invoker::{token_budget, DEFAULT_MAX_OUTPUT_TOKENS};
use crate::request::{AgeBand, LengthTier};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Word-count window and token budget for one length tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LengthPolicy {
    pub min_words: u32,
    pub target_words: u32,
    pub max_words: u32,
    pub token_budget: u32,
    pub reading_time_label: String,
}

impl LengthPolicy {
    pub fn new(
        min_words: u32,
        target_words: u32,
        max_words: u32,
        reading_time_label: impl Into<String>,
        max_output_tokens: u32,
    ) -> Self {
        Self {
            min_words,
            target_words,
            max_words,
            token_budget: token_budget(target_words, max_output_tokens),
            reading_time_label: reading_time_label.into(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.target_words == 0 {
            return Err("target_words must be greater than zero".to_string());
        }
        if self.min_words > self.target_words || self.target_words > self.max_words {
            return Err(format!(
                "word window must satisfy min <= target <= max (got {} / {} / {})",
                self.min_words, self.target_words, self.max_words
            ));
        }
        Ok(())
    }
}

/// Reading-level guidance for one age band
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentPolicy {
    pub vocabulary_level: String,
    pub sentence_length_guide: String,
    pub allowed_themes_hint: String,
    pub tone_hint: String,
}

/// Length policy as written in configuration; the token budget is derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LengthPolicyEntry {
    pub min_words: u32,
    pub target_words: u32,
    pub max_words: u32,
    pub reading_time_label: String,
}

/// Policy overrides keyed by tier / band name
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyOverrides {
    #[serde(default)]
    pub length: BTreeMap<String, LengthPolicyEntry>,
    #[serde(default)]
    pub content: BTreeMap<String, ContentPolicy>,
}

/// The full policy table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyTable {
    length: BTreeMap<LengthTier, LengthPolicy>,
    content: BTreeMap<AgeBand, ContentPolicy>,
}

impl Default for PolicyTable {
    fn default() -> Self {
        Self::standard(DEFAULT_MAX_OUTPUT_TOKENS)
    }
}

impl PolicyTable {
    /// Empty table; every lookup misses until entries are inserted.
    pub fn empty() -> Self {
        Self {
            length: BTreeMap::new(),
            content: BTreeMap::new(),
        }
    }

    /// The built-in table, with token budgets clamped to `max_output_tokens`.
    pub fn standard(max_output_tokens: u32) -> Self {
        let mut length = BTreeMap::new();
        length.insert(
            LengthTier::Short,
            LengthPolicy::new(300, 375, 450, "2-3 minutes", max_output_tokens),
        );
        length.insert(
            LengthTier::Medium,
            LengthPolicy::new(600, 750, 900, "5-6 minutes", max_output_tokens),
        );
        length.insert(
            LengthTier::Long,
            LengthPolicy::new(1000, 1250, 1500, "8-10 minutes", max_output_tokens),
        );
        length.insert(
            LengthTier::Epic,
            LengthPolicy::new(1600, 2000, 2400, "12-15 minutes", max_output_tokens),
        );

        let mut content = BTreeMap::new();
        content.insert(
            AgeBand::PreReader,
            ContentPolicy {
                vocabulary_level: "very simple, everyday words a three to five year old hears at home"
                    .to_string(),
                sentence_length_guide: "short sentences of five to eight words, with gentle repetition"
                    .to_string(),
                allowed_themes_hint: "familiar settings, friendly animals, family, bedtime and play"
                    .to_string(),
                tone_hint: "warm, soothing and playful, with a cozy happy ending".to_string(),
            },
        );
        content.insert(
            AgeBand::EarlyReader,
            ContentPolicy {
                vocabulary_level: "simple words with a few new ones explained by context".to_string(),
                sentence_length_guide: "sentences of eight to twelve words".to_string(),
                allowed_themes_hint: "small adventures, friendship, school and nature".to_string(),
                tone_hint: "cheerful and encouraging, with light humor".to_string(),
            },
        );
        content.insert(
            AgeBand::DevelopingReader,
            ContentPolicy {
                vocabulary_level: "richer vocabulary with descriptive adjectives".to_string(),
                sentence_length_guide: "varied sentences of ten to fifteen words".to_string(),
                allowed_themes_hint: "quests, mysteries, teamwork and mild suspense".to_string(),
                tone_hint: "adventurous and curious, resolving any tension kindly".to_string(),
            },
        );
        content.insert(
            AgeBand::IndependentReader,
            ContentPolicy {
                vocabulary_level: "age-appropriate advanced vocabulary and figurative language"
                    .to_string(),
                sentence_length_guide: "complex sentences mixed with short punchy ones".to_string(),
                allowed_themes_hint:
                    "layered adventures, moral choices, courage and growing up".to_string(),
                tone_hint: "engaging and thoughtful, with meaningful character growth".to_string(),
            },
        );

        Self { length, content }
    }

    /// Apply named overrides on top of this table.
    pub fn with_overrides(
        mut self,
        overrides: &PolicyOverrides,
        max_output_tokens: u32,
    ) -> Result<Self, StoryError> {
        for (name, entry) in &overrides.length {
            let tier: LengthTier = name.parse()?;
            self.insert_length(
                tier,
                LengthPolicy::new(
                    entry.min_words,
                    entry.target_words,
                    entry.max_words,
                    entry.reading_time_label.clone(),
                    max_output_tokens,
                ),
            );
        }
        for (name, policy) in &overrides.content {
            let band: AgeBand = name.parse()?;
            self.insert_content(band, policy.clone());
        }
        self.validate()
            .map_err(|errors| StoryError::ConfigError(errors.join("; ")))?;
        Ok(self)
    }

    pub fn insert_length(&mut self, tier: LengthTier, policy: LengthPolicy) {
        self.length.insert(tier, policy);
    }

    pub fn insert_content(&mut self, band: AgeBand, policy: ContentPolicy) {
        self.content.insert(band, policy);
    }

    pub fn lookup_length_policy(&self, tier: LengthTier) -> Result<&LengthPolicy, StoryError> {
        self.length
            .get(&tier)
            .ok_or_else(|| StoryError::UnknownTier(tier.to_string()))
    }

    pub fn lookup_content_policy(&self, band: AgeBand) -> Result<&ContentPolicy, StoryError> {
        self.content
            .get(&band)
            .ok_or_else(|| StoryError::UnknownAgeBand(band.to_string()))
    }

    pub fn lookup_length_policy_by_name(&self, name: &str) -> Result<&LengthPolicy, StoryError> {
        self.lookup_length_policy(name.parse()?)
    }

    pub fn lookup_content_policy_by_name(&self, name: &str) -> Result<&ContentPolicy, StoryError> {
        self.lookup_content_policy(name.parse()?)
    }

    pub fn length_entries(&self) -> impl Iterator<Item = (&LengthTier, &LengthPolicy)> {
        self.length.iter()
    }

    pub fn content_entries(&self) -> impl Iterator<Item = (&AgeBand, &ContentPolicy)> {
        self.content.iter()
    }

    pub fn validate(&self) -> Result<(), Vec<String>> {
        let errors: Vec<String> = self
            .length
            .iter()
            .filter_map(|(tier, policy)| {
                policy
                    .validate()
                    .err()
                    .map(|e| format!("length tier '{}': {}", tier, e))
            })
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
