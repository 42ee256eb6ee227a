//! Response Shaper
//!
//! Pulls a title and body out of raw model text and packages the winning
//! attempt as the returned story. Extraction never fails: text with nothing
//! usable in it yields an empty title and body, which the scorer grades low.

use crate::retry::GenerationAttempt;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lines scanned for a `TITLE:` marker before falling back to the first line.
const TITLE_MARKER_SCAN_LINES: usize = 3;

/// Title and body split out of raw model output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedStory {
    pub title: String,
    pub body: String,
    pub word_count: u32,
}

/// The story handed back to the caller. Not persisted here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub title: String,
    pub body: String,
    pub word_count: u32,
    pub quality_score: u8,
    pub attempts_used: u32,
    pub model_used: String,
    pub generated_at: DateTime<Utc>,
    pub character_name: String,
    pub reading_time_label: String,
}

impl GenerationResult {
    /// Whether the story reached the given quality bar. A result below it is
    /// still a valid story; callers decide whether to tell the reader.
    pub fn meets_threshold(&self, threshold: u8) -> bool {
        self.quality_score >= threshold
    }
}

/// Words in `text`: non-empty whitespace-separated tokens.
pub fn count_words(text: &str) -> u32 {
    text.split_whitespace().count() as u32
}

/// Split raw model output into title and body.
pub fn extract(raw_text: &str) -> ExtractedStory {
    let normalized = raw_text.replace("\r\n", "\n");
    let lines: Vec<&str> = normalized.lines().collect();

    let non_empty: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| !strip_markup(line).is_empty())
        .map(|(idx, _)| idx)
        .collect();

    let marker = non_empty
        .iter()
        .take(TITLE_MARKER_SCAN_LINES)
        .find_map(|&idx| title_from_marker(lines[idx]).map(|title| (idx, title)));

    let (title_idx, title) = match marker {
        Some((idx, title)) => (Some(idx), title),
        None => match non_empty.iter().find(|&&idx| !is_word_count_line(lines[idx])) {
            Some(&idx) => (Some(idx), clean_title(strip_markup(lines[idx]))),
            None => (None, String::new()),
        },
    };

    let kept: Vec<&str> = lines
        .iter()
        .enumerate()
        .filter(|(idx, line)| Some(*idx) != title_idx && !is_word_count_line(line))
        .map(|(_, line)| line.trim_end())
        .collect();

    let body = collapse_blank_lines(&kept);
    let word_count = count_words(&body);

    ExtractedStory {
        title,
        body,
        word_count,
    }
}

/// Package the winning attempt.
pub fn shape(
    best: &GenerationAttempt,
    model_used: &str,
    attempts_used: u32,
    character_name: &str,
    reading_time_label: &str,
) -> GenerationResult {
    GenerationResult {
        title: best.extracted_title.clone(),
        body: best.extracted_body.clone(),
        word_count: best.word_count,
        quality_score: best.quality_score,
        attempts_used,
        model_used: model_used.to_string(),
        generated_at: Utc::now(),
        character_name: character_name.to_string(),
        reading_time_label: reading_time_label.to_string(),
    }
}

fn is_markup(c: char) -> bool {
    matches!(c, '#' | '*' | '_' | '>' | '-' | '=') || c.is_whitespace()
}

fn strip_markup(line: &str) -> &str {
    line.trim_start_matches(is_markup)
        .trim_end_matches(|c: char| matches!(c, '#' | '*' | '_') || c.is_whitespace())
}

fn clean_title(title: &str) -> String {
    strip_markup(title)
        .trim_matches(|c: char| matches!(c, '"' | '“' | '”'))
        .trim()
        .to_string()
}

fn has_prefix_ignore_case(text: &str, prefix: &str) -> bool {
    text.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// Text after the colon of a marker such as `word count:`. Emphasis between
/// the marker word and its colon (`**Title**:`) is tolerated.
fn after_marker<'a>(stripped: &'a str, marker: &str) -> Option<&'a str> {
    if !has_prefix_ignore_case(stripped, marker) {
        return None;
    }
    stripped[marker.len()..]
        .trim_start_matches(|c: char| matches!(c, '*' | '_') || c.is_whitespace())
        .strip_prefix(':')
}

fn title_from_marker(line: &str) -> Option<String> {
    after_marker(strip_markup(line), "title").map(clean_title)
}

fn is_word_count_line(line: &str) -> bool {
    after_marker(strip_markup(line), "word count").is_some()
}

/// Join lines, keeping at most one blank line between paragraphs.
fn collapse_blank_lines(lines: &[&str]) -> String {
    let mut out = String::new();
    let mut pending_blank = false;
    for line in lines {
        if line.trim().is_empty() {
            pending_blank = !out.is_empty();
            continue;
        }
        if !out.is_empty() {
            out.push_str(if pending_blank { "\n\n" } else { "\n" });
        }
        out.push_str(line);
        pending_blank = false;
    }
    out
}
