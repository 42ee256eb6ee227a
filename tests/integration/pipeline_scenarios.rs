//! End-to-end pipeline scenarios against a scripted text provider

use crate::integration::{story_for, ScriptedGenerator};
use std::time::Duration;
use storyloom::error::{ProviderFailure, StoryError};
use storyloom::pipeline::StoryService;
use storyloom::request::{AgeBand, Gender, GenerationRequest, LengthTier};
use storyloom::retry::{RetryPolicy, MAX_ATTEMPTS_CAP};

fn emma_request() -> GenerationRequest {
    GenerationRequest::new(
        "Emma",
        AgeBand::PreReader,
        LengthTier::Short,
        vec!["animals".to_string()],
        Gender::Girl,
        None,
        true,
    )
    .unwrap()
}

#[tokio::test]
async fn test_exact_length_story_is_accepted_first_time() {
    let generator = ScriptedGenerator::new(vec![Ok(story_for("Emma", 375))]);
    let service = StoryService::new(generator.clone());

    let result = service.generate(&emma_request()).await.unwrap();

    assert_eq!(result.quality_score, 88);
    assert_eq!(result.attempts_used, 1);
    assert_eq!(result.word_count, 375);
    assert_eq!(result.title, "Emma and the Sleepy Owl");
    assert!(!result.body.contains("WORD COUNT"));
    assert!(result.meets_threshold(85));

    let requests = generator.requests.lock();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].max_tokens, 525);
    assert!((requests[0].temperature - 0.8).abs() < f32::EPSILON);
}

#[tokio::test]
async fn test_short_draft_is_retried_with_escalated_prompt() {
    let generator = ScriptedGenerator::new(vec![
        Ok(story_for("Emma", 100)),
        Ok(story_for("Emma", 375)),
    ]);
    let service = StoryService::new(generator.clone());

    let result = service.generate(&emma_request()).await.unwrap();

    assert_eq!(result.attempts_used, 2);
    assert_eq!(result.word_count, 375);

    let prompts = generator.user_prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[0].contains("EXACTLY 375 words"));
    assert!(!prompts[0].contains("Reminder"));
    assert!(prompts[1].contains("Reminder"));
}

#[tokio::test]
async fn test_never_more_than_three_attempts() {
    let generator = ScriptedGenerator::new(vec![
        Ok(story_for("Emma", 100)),
        Ok(story_for("Emma", 120)),
        Ok(story_for("Emma", 110)),
        Ok(story_for("Emma", 375)),
    ]);
    let service = StoryService::new(generator.clone());

    let result = service.generate(&emma_request()).await.unwrap();

    assert_eq!(result.attempts_used, MAX_ATTEMPTS_CAP);
    assert_eq!(generator.requests.lock().len(), 3);
    assert_eq!(result.word_count, 120);
    assert!(!result.meets_threshold(85));
    assert!(generator.user_prompts()[2].contains("MANDATORY"));
}

#[tokio::test]
async fn test_three_network_errors_fail_generation() {
    let generator = ScriptedGenerator::new(vec![
        Err(ProviderFailure::Network("connection reset".to_string())),
        Err(ProviderFailure::Network("connection reset".to_string())),
        Err(ProviderFailure::Network("connection refused".to_string())),
    ]);
    let service = StoryService::new(generator.clone());

    let err = service.generate(&emma_request()).await.unwrap_err();

    assert!(matches!(
        err,
        StoryError::GenerationFailed(ProviderFailure::Network(ref msg)) if msg == "connection refused"
    ));
    assert_eq!(err.http_status(), 502);
    assert_eq!(generator.requests.lock().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_slow_provider_times_out_each_attempt() {
    let generator = ScriptedGenerator::with_delay(
        vec![
            Ok(story_for("Emma", 375)),
            Ok(story_for("Emma", 375)),
            Ok(story_for("Emma", 375)),
        ],
        Duration::from_secs(120),
    );
    let service = StoryService::new(generator.clone());

    let err = service.generate(&emma_request()).await.unwrap_err();

    assert!(matches!(
        err,
        StoryError::GenerationFailed(ProviderFailure::Timeout(45))
    ));
    assert_eq!(generator.requests.lock().len(), 3);
}

#[tokio::test]
async fn test_empty_reply_counts_as_failed_attempt() {
    let generator = ScriptedGenerator::new(vec![Ok("   ".to_string()), Ok(story_for("Emma", 375))]);
    let service = StoryService::new(generator);

    let result = service.generate(&emma_request()).await.unwrap();
    assert_eq!(result.attempts_used, 2);
    assert_eq!(result.quality_score, 88);
}

#[tokio::test]
async fn test_lower_threshold_stops_earlier() {
    let generator = ScriptedGenerator::new(vec![
        Ok(story_for("Emma", 310)),
        Ok(story_for("Emma", 375)),
    ]);
    let service = StoryService::new(generator.clone()).with_retry_policy(RetryPolicy {
        max_attempts: 3,
        satisfaction_threshold: 70,
    });

    let result = service.generate(&emma_request()).await.unwrap();
    assert_eq!(result.attempts_used, 1);
    assert_eq!(generator.requests.lock().len(), 1);
}

#[tokio::test]
async fn test_placeholder_name_is_used_consistently() {
    let request = GenerationRequest::new(
        "Emma",
        AgeBand::EarlyReader,
        LengthTier::Short,
        vec!["space".to_string()],
        Gender::Boy,
        None,
        false,
    )
    .unwrap();
    let preview = StoryService::new(ScriptedGenerator::new(vec![])).with_seed(Some(11));
    let hero = preview.character_name_for(&request);

    let generator = ScriptedGenerator::new(vec![Ok(story_for(&hero, 375))]);
    let service = StoryService::new(generator.clone()).with_seed(Some(11));
    let result = service.generate(&request).await.unwrap();

    assert_eq!(result.character_name, hero);
    assert_eq!(result.quality_score, 88);
    let prompts = generator.user_prompts();
    assert!(prompts[0].contains(&format!("Main character: {}", hero)));
    assert!(!prompts[0].contains("Emma"));
}

#[tokio::test]
async fn test_concurrent_requests_share_one_service() {
    let generator = ScriptedGenerator::new(vec![
        Ok(story_for("Emma", 375)),
        Ok(story_for("Emma", 375)),
    ]);
    let service = StoryService::new(generator.clone());
    let request = emma_request();

    let (first, second) = tokio::join!(service.generate(&request), service.generate(&request));

    assert_eq!(first.unwrap().quality_score, 88);
    assert_eq!(second.unwrap().quality_score, 88);
    assert_eq!(generator.requests.lock().len(), 2);
}
