use crate::pipeline::IllustratedStory;
use comfy_table::Table;
use owo_colors::OwoColorize;

pub fn format_story_text(story: &IllustratedStory, threshold: u8) -> String {
    let result = &story.story;

    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["Field", "Value"]);
    let quality = if result.meets_threshold(threshold) {
        format!("{}/100", result.quality_score)
    } else {
        format!("{}/100 (below {})", result.quality_score, threshold)
    };
    table.add_row(vec!["Character".to_string(), result.character_name.clone()]);
    table.add_row(vec!["Words".to_string(), result.word_count.to_string()]);
    table.add_row(vec![
        "Reading time".to_string(),
        result.reading_time_label.clone(),
    ]);
    table.add_row(vec!["Quality".to_string(), quality]);
    table.add_row(vec!["Attempts".to_string(), result.attempts_used.to_string()]);
    table.add_row(vec!["Model".to_string(), result.model_used.clone()]);
    table.add_row(vec![
        "Generated at".to_string(),
        result.generated_at.to_rfc3339(),
    ]);
    if let Some(illustration) = &story.illustration {
        table.add_row(vec!["Illustration".to_string(), illustration.image_url.clone()]);
    }

    format!(
        "{}\n\n{}\n\n{}",
        result.title.bold().underline(),
        result.body,
        table
    )
}

pub fn format_story_json(story: &IllustratedStory) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(story)
}
