//! Quality Scorer
//!
//! Grades a candidate story 0-100: 40% length accuracy against the target
//! word count, 60% structural checks.

use crate::policy::LengthPolicy;
use crate::retry::GenerationAttempt;
use serde::Serialize;

const LENGTH_WEIGHT: f64 = 0.4;
const STRUCTURE_WEIGHT: f64 = 0.6;
const MIN_TITLE_CHARS: usize = 5;
const DIALOGUE_MARKS: [char; 3] = ['"', '\u{201C}', '\u{201D}'];

/// Per-component view of a score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub length_accuracy: f64,
    pub has_title: bool,
    pub has_paragraphs: bool,
    pub has_dialogue: bool,
    pub meets_minimum: bool,
    pub mentions_character: bool,
}

impl ScoreBreakdown {
    pub const STRUCTURAL_CHECKS: usize = 5;

    pub fn checks_passed(&self) -> usize {
        [
            self.has_title,
            self.has_paragraphs,
            self.has_dialogue,
            self.meets_minimum,
            self.mentions_character,
        ]
        .iter()
        .filter(|passed| **passed)
        .count()
    }

    pub fn structural_quality(&self) -> f64 {
        self.checks_passed() as f64 / Self::STRUCTURAL_CHECKS as f64 * 100.0
    }

    pub fn total(&self) -> u8 {
        let weighted =
            self.length_accuracy * LENGTH_WEIGHT + self.structural_quality() * STRUCTURE_WEIGHT;
        weighted.round().clamp(0.0, 100.0) as u8
    }
}

/// Linear falloff: 100 at the target, 0 at 100% relative deviation or more.
pub fn length_accuracy(actual_words: u32, target_words: u32) -> f64 {
    if target_words == 0 {
        return if actual_words == 0 { 100.0 } else { 0.0 };
    }
    let deviation = (f64::from(actual_words) - f64::from(target_words)).abs();
    (100.0 - deviation / f64::from(target_words) * 100.0).max(0.0)
}

pub fn breakdown(
    attempt: &GenerationAttempt,
    length: &LengthPolicy,
    character_name: &str,
) -> ScoreBreakdown {
    let body = attempt.extracted_body.as_str();
    let name = character_name.trim().to_lowercase();

    ScoreBreakdown {
        length_accuracy: length_accuracy(attempt.word_count, length.target_words),
        has_title: attempt.extracted_title.trim().chars().count() > MIN_TITLE_CHARS,
        has_paragraphs: body.contains("\n\n"),
        has_dialogue: body.contains(&DIALOGUE_MARKS[..]),
        meets_minimum: attempt.word_count > length.min_words,
        mentions_character: !name.is_empty() && body.to_lowercase().contains(&name),
    }
}

/// Final 0-100 score for an attempt.
pub fn score(attempt: &GenerationAttempt, length: &LengthPolicy, character_name: &str) -> u8 {
    breakdown(attempt, length, character_name).total()
}
