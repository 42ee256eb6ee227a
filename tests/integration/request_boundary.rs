//! Inbound request validation and outbound result serialization

use crate::integration::{story_for, ScriptedGenerator};
use storyloom::error::StoryError;
use storyloom::pipeline::StoryService;
use storyloom::policy::PolicyTable;
use storyloom::request::{AgeBand, Gender, GenerationRequest, LengthTier, StoryRequestPayload};

fn parse(json: &str) -> Result<GenerationRequest, StoryError> {
    GenerationRequest::try_from(StoryRequestPayload::from_json(json)?)
}

#[test]
fn test_full_payload_converts() {
    let request = parse(
        r#"{
            "childName": "  Noah ",
            "childAge": "developing-reader",
            "storyLength": "epic",
            "themes": ["dragons", " ", "friendship"],
            "gender": "boy",
            "customPrompt": "Include his dog Biscuit",
            "includeNameInStory": false
        }"#,
    )
    .unwrap();

    assert_eq!(request.child_name(), "Noah");
    assert_eq!(request.age_band(), AgeBand::DevelopingReader);
    assert_eq!(request.length_tier(), LengthTier::Epic);
    assert_eq!(request.themes(), ["dragons", "friendship"]);
    assert_eq!(request.gender(), Gender::Boy);
    assert_eq!(request.custom_prompt(), Some("Include his dog Biscuit"));
    assert!(!request.include_name_in_story());
}

#[test]
fn test_optional_fields_default() {
    let request = parse(
        r#"{"childName": "Ada", "childAge": "early-reader", "storyLength": "medium", "themes": ["robots"]}"#,
    )
    .unwrap();
    assert_eq!(request.gender(), Gender::Neutral);
    assert!(request.include_name_in_story());
    assert_eq!(request.custom_prompt(), None);
}

#[test]
fn test_invalid_payloads_are_bad_requests() {
    let cases = [
        r#"{"childAge": "pre-reader", "storyLength": "short", "themes": ["a"]}"#,
        r#"{"childName": "   ", "childAge": "pre-reader", "storyLength": "short", "themes": ["a"]}"#,
        r#"{"childName": "Ada", "storyLength": "short", "themes": ["a"]}"#,
        r#"{"childName": "Ada", "childAge": "teenager", "storyLength": "short", "themes": ["a"]}"#,
        r#"{"childName": "Ada", "childAge": "pre-reader", "storyLength": "saga", "themes": ["a"]}"#,
        r#"{"childName": "Ada", "childAge": "pre-reader", "storyLength": "short", "themes": []}"#,
        r#"{"childName": "Ada", "childAge": "pre-reader", "storyLength": "short", "themes": ["a"], "gender": "robot"}"#,
        r#"{"childName": "Ada""#,
    ];
    for json in cases {
        let err = parse(json).unwrap_err();
        assert!(
            matches!(err, StoryError::InvalidRequest(_)),
            "expected InvalidRequest for {}",
            json
        );
        assert_eq!(err.http_status(), 400);
    }
}

#[test]
fn test_direct_lookup_by_unknown_name() {
    let table = PolicyTable::default();
    assert!(matches!(
        table.lookup_length_policy_by_name("nonexistent-tier"),
        Err(StoryError::UnknownTier(_))
    ));
    assert!(matches!(
        table.lookup_content_policy_by_name("toddler"),
        Err(StoryError::UnknownAgeBand(_))
    ));
    assert_eq!(
        table.lookup_length_policy_by_name("long").unwrap().target_words,
        1250
    );
}

#[tokio::test]
async fn test_result_serializes_camel_case() {
    let generator = ScriptedGenerator::new(vec![Ok(story_for("Emma", 375))]);
    let service = StoryService::new(generator);
    let payload = StoryRequestPayload::from_json(
        r#"{"childName": "Emma", "childAge": "pre-reader", "storyLength": "short", "themes": ["owls"], "gender": "girl"}"#,
    )
    .unwrap();

    let result = service.generate_from_payload(payload).await.unwrap();
    let value = serde_json::to_value(&result).unwrap();

    assert_eq!(value["wordCount"], 375);
    assert_eq!(value["qualityScore"], 88);
    assert_eq!(value["attemptsUsed"], 1);
    assert_eq!(value["modelUsed"], "gpt-4o-mini");
    assert_eq!(value["readingTimeLabel"], "2-3 minutes");
    assert!(value["generatedAt"].is_string());
}
