//! Integration tests for layered configuration loading

use crate::integration::{EnvGuard, ENV_MUTEX};
use storyloom::config::{ConfigLoader, ValidationError};
use storyloom::error::StoryError;
use storyloom::pipeline::StoryService;
use storyloom::provider::ProviderType;
use storyloom::request::{AgeBand, LengthTier};
use tempfile::TempDir;

#[test]
fn test_config_file_sections_deserialize() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("storyloom.toml");

    std::fs::write(
        &config_file,
        r#"
[provider]
provider_type = "anthropic"
api_key_env = "ANTHROPIC_API_KEY"
endpoint = "https://proxy.example/v1"

[models]
baseline = "claude-3-5-haiku"
advanced = "claude-3-5-sonnet"

[generation]
temperature = 0.7
timeout_secs = 30
seed = 99

[generation.retry]
max_attempts = 2
satisfaction_threshold = 90

[policy.length.short]
min_words = 200
target_words = 250
max_words = 300
reading_time_label = "about 2 minutes"

[policy.content.pre-reader]
vocabulary_level = "tiny words"
sentence_length_guide = "very short"
allowed_themes_hint = "animals"
tone_hint = "gentle"

[illustration]
enabled = true
size = "512x512"

[logging]
level = "debug"
format = "json"
"#,
    )
    .unwrap();

    let config = ConfigLoader::load_from_file(&config_file).unwrap();
    assert!(config.validate().is_ok());

    assert_eq!(config.provider.provider_type, ProviderType::Anthropic);
    assert_eq!(config.models.advanced, "claude-3-5-sonnet");
    assert_eq!(config.generation.timeout_secs, 30);
    assert_eq!(config.generation.seed, Some(99));
    assert_eq!(config.generation.retry.max_attempts, 2);
    assert_eq!(config.generation.retry.satisfaction_threshold, 90);
    assert!(config.illustration.enabled);
    assert_eq!(config.illustration.model, "dall-e-3");
    assert_eq!(config.logging.format, "json");

    let table = config.policy_table().unwrap();
    let short = table.lookup_length_policy(LengthTier::Short).unwrap();
    assert_eq!(short.target_words, 250);
    assert_eq!(short.token_budget, 350);
    assert_eq!(
        table.lookup_length_policy(LengthTier::Medium).unwrap().target_words,
        750
    );
    assert_eq!(
        table.lookup_content_policy(AgeBand::PreReader).unwrap().tone_hint,
        "gentle"
    );
}

#[test]
fn test_layers_merge_in_order() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let xdg = TempDir::new().unwrap();
    let workdir = TempDir::new().unwrap();

    let global_dir = xdg.path().join("storyloom");
    std::fs::create_dir_all(&global_dir).unwrap();
    std::fs::write(
        global_dir.join("config.toml"),
        r#"
[models]
baseline = "global-model"

[generation]
temperature = 0.5
"#,
    )
    .unwrap();

    let config_dir = workdir.path().join("config");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(
        config_dir.join("config.toml"),
        r#"
[generation]
temperature = 0.6
timeout_secs = 20
"#,
    )
    .unwrap();
    std::fs::write(
        config_dir.join("staging.toml"),
        r#"
[generation]
timeout_secs = 30
"#,
    )
    .unwrap();

    let _env = EnvGuard::set(&[
        ("XDG_CONFIG_HOME", xdg.path().to_str().unwrap()),
        ("STORYLOOM_ENV", "staging"),
        ("STORYLOOM__GENERATION__SEED", "42"),
    ]);

    let config = ConfigLoader::load(workdir.path()).unwrap();

    assert_eq!(config.models.baseline, "global-model");
    assert_eq!(config.models.advanced, "gpt-4o");
    assert!((config.generation.temperature - 0.6).abs() < 1e-6);
    assert_eq!(config.generation.timeout_secs, 30);
    assert_eq!(config.generation.seed, Some(42));
    assert_eq!(
        ConfigLoader::global_config_path(),
        Some(global_dir.join("config.toml"))
    );
}

#[test]
fn test_empty_workdir_yields_defaults() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let xdg = TempDir::new().unwrap();
    let workdir = TempDir::new().unwrap();
    let _env = EnvGuard::set(&[("XDG_CONFIG_HOME", xdg.path().to_str().unwrap())]);

    let config = ConfigLoader::load(workdir.path()).unwrap();
    assert_eq!(config.generation.retry.max_attempts, 3);
    assert_eq!(config.generation.retry.satisfaction_threshold, 85);
    assert_eq!(config.generation.timeout_secs, 45);
    assert_eq!(config.models.baseline, "gpt-4o-mini");
    assert!(!config.illustration.enabled);
}

#[test]
fn test_invalid_values_are_reported_together() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("bad.toml");
    std::fs::write(
        &config_file,
        r#"
[provider]
api_key = "k"
endpoint = "ftp://nowhere"

[generation.retry]
max_attempts = 5

[policy.length.gigantic]
min_words = 1
target_words = 2
max_words = 3
reading_time_label = "1 minute"
"#,
    )
    .unwrap();

    let config = ConfigLoader::load_from_file(&config_file).unwrap();
    let errors = config.validate().unwrap_err();
    assert!(errors.iter().any(|e| matches!(e, ValidationError::Provider(_))));
    assert!(errors.iter().any(|e| matches!(e, ValidationError::Generation(_))));
    assert!(errors.iter().any(|e| matches!(e, ValidationError::Policy(_))));

    let err = StoryService::from_config(&config).err().unwrap();
    assert!(matches!(err, StoryError::ConfigError(_)));
    assert_eq!(err.http_status(), 500);
}

#[test]
fn test_missing_config_file_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let result = ConfigLoader::load_from_file(&temp_dir.path().join("absent.toml"));
    assert!(result.is_err());
}
