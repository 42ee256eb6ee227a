use crate::retry::GenerationAttempt;
use crate::scoring::ScoreBreakdown;
use comfy_table::Table;
use serde_json::json;

fn mark(passed: bool) -> &'static str {
    if passed {
        "yes"
    } else {
        "no"
    }
}

pub fn format_score_text(
    attempt: &GenerationAttempt,
    breakdown: &ScoreBreakdown,
    threshold: u8,
) -> String {
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["Check", "Result"]);
    table.add_row(vec!["Title".to_string(), attempt.extracted_title.clone()]);
    table.add_row(vec!["Words".to_string(), attempt.word_count.to_string()]);
    table.add_row(vec![
        "Length accuracy".to_string(),
        format!("{:.1}", breakdown.length_accuracy),
    ]);
    table.add_row(vec!["Has title".to_string(), mark(breakdown.has_title).to_string()]);
    table.add_row(vec![
        "Has paragraphs".to_string(),
        mark(breakdown.has_paragraphs).to_string(),
    ]);
    table.add_row(vec![
        "Has dialogue".to_string(),
        mark(breakdown.has_dialogue).to_string(),
    ]);
    table.add_row(vec![
        "Meets minimum".to_string(),
        mark(breakdown.meets_minimum).to_string(),
    ]);
    table.add_row(vec![
        "Mentions character".to_string(),
        mark(breakdown.mentions_character).to_string(),
    ]);
    table.add_row(vec![
        "Score".to_string(),
        format!("{}/100 (threshold {})", attempt.quality_score, threshold),
    ]);
    table.to_string()
}

pub fn format_score_json(
    attempt: &GenerationAttempt,
    breakdown: &ScoreBreakdown,
    threshold: u8,
) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&json!({
        "title": attempt.extracted_title,
        "wordCount": attempt.word_count,
        "qualityScore": attempt.quality_score,
        "threshold": threshold,
        "meetsThreshold": attempt.quality_score >= threshold,
        "breakdown": breakdown,
    }))
}
