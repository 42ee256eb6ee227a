//! CLI route table against files on disk

use crate::integration::{story_for, ENV_MUTEX};
use clap::Parser;
use std::path::PathBuf;
use storyloom::cli::{map_error, Cli, Commands, RunContext};
use storyloom::config::StoryloomConfig;
use tempfile::TempDir;

const REQUEST: &str = r#"{
    "childName": "Emma",
    "childAge": "pre-reader",
    "storyLength": "short",
    "themes": ["owls"],
    "gender": "girl"
}"#;

#[test]
fn test_cli_parses_global_flags() {
    let cli = Cli::try_parse_from([
        "storyloom",
        "--workdir",
        "/tmp/stories",
        "--log-format",
        "json",
        "generate",
        "--request",
        "req.json",
        "--seed",
        "3",
        "--illustrate",
    ])
    .unwrap();
    assert_eq!(cli.workdir, PathBuf::from("/tmp/stories"));
    assert_eq!(cli.log_format.as_deref(), Some("json"));
    match cli.command {
        Commands::Generate {
            request,
            seed,
            illustrate,
            format,
        } => {
            assert_eq!(request, PathBuf::from("req.json"));
            assert_eq!(seed, Some(3));
            assert!(illustrate);
            assert_eq!(format, "text");
        }
        _ => panic!("expected generate"),
    }
}

#[test]
fn test_policy_command_uses_workdir_config() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let workdir = TempDir::new().unwrap();
    let config_dir = workdir.path().join("config");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(
        config_dir.join("config.toml"),
        r#"
[policy.length.short]
min_words = 200
target_words = 250
max_words = 300
reading_time_label = "about 2 minutes"
"#,
    )
    .unwrap();

    let context = RunContext::new(workdir.path().to_path_buf(), None).unwrap();
    let output = context
        .execute(&Commands::Policy {
            format: "json".to_string(),
        })
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(value["length"]["short"]["target_words"], 250);
    assert_eq!(value["length"]["short"]["reading_time_label"], "about 2 minutes");
}

#[test]
fn test_score_command_text_output() {
    let workdir = TempDir::new().unwrap();
    std::fs::write(workdir.path().join("request.json"), REQUEST).unwrap();
    std::fs::write(workdir.path().join("story.txt"), story_for("Emma", 375)).unwrap();

    let context = RunContext::with_config(StoryloomConfig::default(), workdir.path().to_path_buf());
    let output = context
        .execute(&Commands::Score {
            request: PathBuf::from("request.json"),
            story: workdir.path().join("story.txt"),
            character: None,
            seed: None,
            format: "text".to_string(),
        })
        .unwrap();
    assert!(output.contains("Emma and the Sleepy Owl"));
    assert!(output.contains("88/100 (threshold 85)"));
}

#[test]
fn test_generate_without_api_key_reports_config_error() {
    let workdir = TempDir::new().unwrap();
    std::fs::write(workdir.path().join("request.json"), REQUEST).unwrap();

    let mut config = StoryloomConfig::default();
    config.provider.api_key_env = Some("STORYLOOM_TEST_UNSET_API_KEY".to_string());
    let context = RunContext::with_config(config, workdir.path().to_path_buf());
    let err = context
        .execute(&Commands::Generate {
            request: PathBuf::from("request.json"),
            seed: None,
            illustrate: false,
            format: "text".to_string(),
        })
        .unwrap_err();
    assert!(map_error(&err).starts_with("error[500]: "));
}

#[test]
fn test_missing_request_file_keeps_path_in_message() {
    let workdir = TempDir::new().unwrap();
    let context = RunContext::with_config(StoryloomConfig::default(), workdir.path().to_path_buf());
    let err = context
        .execute(&Commands::Score {
            request: PathBuf::from("missing.json"),
            story: PathBuf::from("story.txt"),
            character: None,
            seed: None,
            format: "text".to_string(),
        })
        .unwrap_err();
    let message = map_error(&err);
    assert!(message.starts_with("error: "));
    assert!(message.contains("missing.json"));
}
