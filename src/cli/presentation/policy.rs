use crate::policy::PolicyTable;
use comfy_table::Table;
use serde_json::json;

pub fn format_policy_text(table: &PolicyTable) -> String {
    let mut lengths = Table::new();
    lengths.load_preset(comfy_table::presets::UTF8_FULL);
    lengths.set_header(vec!["Tier", "Min", "Target", "Max", "Tokens", "Reading time"]);
    for (tier, policy) in table.length_entries() {
        lengths.add_row(vec![
            tier.to_string(),
            policy.min_words.to_string(),
            policy.target_words.to_string(),
            policy.max_words.to_string(),
            policy.token_budget.to_string(),
            policy.reading_time_label.clone(),
        ]);
    }

    let mut content = Table::new();
    content.load_preset(comfy_table::presets::UTF8_FULL);
    content.set_header(vec!["Age band", "Vocabulary", "Sentences", "Themes", "Tone"]);
    for (band, policy) in table.content_entries() {
        content.add_row(vec![
            band.to_string(),
            policy.vocabulary_level.clone(),
            policy.sentence_length_guide.clone(),
            policy.allowed_themes_hint.clone(),
            policy.tone_hint.clone(),
        ]);
    }

    format!("Length policies\n{}\n\nContent policies\n{}", lengths, content)
}

pub fn format_policy_json(table: &PolicyTable) -> Result<String, serde_json::Error> {
    let length: serde_json::Map<String, serde_json::Value> = table
        .length_entries()
        .map(|(tier, policy)| Ok((tier.to_string(), serde_json::to_value(policy)?)))
        .collect::<Result<_, serde_json::Error>>()?;
    let content: serde_json::Map<String, serde_json::Value> = table
        .content_entries()
        .map(|(band, policy)| Ok((band.to_string(), serde_json::to_value(policy)?)))
        .collect::<Result<_, serde_json::Error>>()?;
    serde_json::to_string_pretty(&json!({ "length": length, "content": content }))
}
