//! Prompt Builder
//!
//! Composes the generation instruction from the request and its policies.
//! The only nondeterminism is placeholder-name selection, which draws from a
//! caller-supplied RNG so a fixed seed gives a fixed prompt.

use crate::policy::{ContentPolicy, LengthPolicy};
use crate::request::{AgeBand, Gender, GenerationRequest};
use rand::seq::SliceRandom;
use rand::Rng;

const DEFAULT_SYSTEM_INSTRUCTION: &str = "You are a gifted children's author. You write \
original, age-appropriate, kind-hearted stories and you always follow length and \
formatting instructions precisely.";

const YOUNG_BOY_NAMES: &[&str] = &["Max", "Leo", "Sam", "Ben", "Theo", "Finn"];
const YOUNG_GIRL_NAMES: &[&str] = &["Lily", "Mia", "Rosie", "Ella", "Ruby", "Zoe"];
const YOUNG_NEUTRAL_NAMES: &[&str] = &["Pip", "Sunny", "Robin", "Kit", "Bean", "Sky"];
const OLDER_BOY_NAMES: &[&str] = &["Oliver", "Jasper", "Ethan", "Lucas", "Henry", "Milo"];
const OLDER_GIRL_NAMES: &[&str] = &["Amelia", "Isla", "Hazel", "Clara", "Nora", "Ivy"];
const OLDER_NEUTRAL_NAMES: &[&str] = &["Jordan", "Riley", "Avery", "Quinn", "Rowan", "Sage"];

/// Placeholder names for a (gender, age band) pair.
pub fn name_pool(gender: Gender, age_band: AgeBand) -> &'static [&'static str] {
    let young = matches!(age_band, AgeBand::PreReader | AgeBand::EarlyReader);
    match (gender, young) {
        (Gender::Boy, true) => YOUNG_BOY_NAMES,
        (Gender::Girl, true) => YOUNG_GIRL_NAMES,
        (Gender::Neutral, true) => YOUNG_NEUTRAL_NAMES,
        (Gender::Boy, false) => OLDER_BOY_NAMES,
        (Gender::Girl, false) => OLDER_GIRL_NAMES,
        (Gender::Neutral, false) => OLDER_NEUTRAL_NAMES,
    }
}

/// The name the story's hero goes by.
///
/// The child's own name when they asked to be in the story, otherwise a pool
/// name. Resolved once per request and shared by every attempt.
pub fn resolve_character_name<R: Rng + ?Sized>(request: &GenerationRequest, rng: &mut R) -> String {
    if request.include_name_in_story() {
        return request.child_name().to_string();
    }
    name_pool(request.gender(), request.age_band())
        .choose(rng)
        .map(|name| name.to_string())
        .unwrap_or_else(|| "Sunny".to_string())
}

/// Natural-language list: "a", "a and b", "a, b and c".
pub fn join_themes(themes: &[String]) -> String {
    match themes {
        [] => String::new(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}

/// System instruction plus user prompt for one attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptText {
    pub system: String,
    pub user: String,
}

#[derive(Debug, Clone)]
pub struct PromptBuilder {
    system_instruction: String,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self {
            system_instruction: DEFAULT_SYSTEM_INSTRUCTION.to_string(),
        }
    }
}

impl PromptBuilder {
    pub fn with_system_instruction(system_instruction: impl Into<String>) -> Self {
        Self {
            system_instruction: system_instruction.into(),
        }
    }

    pub fn build(
        &self,
        request: &GenerationRequest,
        length: &LengthPolicy,
        content: &ContentPolicy,
        character_name: &str,
        attempt_number: u32,
    ) -> PromptText {
        let mut lines = vec![
            format!(
                "Write a children's story that is EXACTLY {} words long.",
                length.target_words
            ),
            format!(
                "The story is for {} and should take about {} to read aloud.",
                audience(request.age_band()),
                length.reading_time_label
            ),
            String::new(),
            format!(
                "Main character: {}, a {}.",
                character_name,
                hero_noun(request.gender())
            ),
            format!("Themes: {}.", join_themes(request.themes())),
            format!("Vocabulary: {}.", content.vocabulary_level),
            format!("Sentences: {}.", content.sentence_length_guide),
            format!("Suitable subject matter: {}.", content.allowed_themes_hint),
            format!("Tone: {}.", content.tone_hint),
        ];

        if let Some(custom) = request.custom_prompt() {
            lines.push(format!("Additional request: {}", custom));
        }

        lines.extend([
            String::new(),
            "Format your answer exactly like this:".to_string(),
            "TITLE: <a short, memorable title>".to_string(),
            String::new(),
            "<the story, in several paragraphs separated by blank lines, with some dialogue>"
                .to_string(),
            String::new(),
            "WORD COUNT: <number of words in the story>".to_string(),
        ]);

        if let Some(escalation) = escalation(attempt_number, length) {
            lines.push(String::new());
            lines.push(escalation);
        }

        PromptText {
            system: self.system_instruction.clone(),
            user: lines.join("\n"),
        }
    }
}

fn escalation(attempt_number: u32, length: &LengthPolicy) -> Option<String> {
    match attempt_number {
        0 | 1 => None,
        2 => Some(format!(
            "Reminder: the previous draft missed the requested length. Please aim for {} words, \
             and never fewer than {}.",
            length.target_words, length.min_words
        )),
        _ => Some(format!(
            "MANDATORY: the story MUST contain exactly {} words. Drafts shorter than {} words or \
             longer than {} words are rejected. Count every word before you finish and keep \
             writing until you reach {}.",
            length.target_words, length.min_words, length.max_words, length.target_words
        )),
    }
}

fn audience(age_band: AgeBand) -> &'static str {
    match age_band {
        AgeBand::PreReader => "children aged 3 to 5, read aloud by a grown-up",
        AgeBand::EarlyReader => "children aged 5 to 7 who are starting to read",
        AgeBand::DevelopingReader => "children aged 7 to 9",
        AgeBand::IndependentReader => "confident readers aged 9 to 12",
    }
}

fn hero_noun(gender: Gender) -> &'static str {
    match gender {
        Gender::Boy => "boy",
        Gender::Girl => "girl",
        Gender::Neutral => "child",
    }
}
