//! CLI route: single route table and run context. Dispatches to the pipeline and presentation.

use crate::cli::parse::Commands;
use crate::cli::presentation::{
    format_policy_json, format_policy_text, format_score_json, format_score_text,
    format_story_json, format_story_text,
};
use crate::config::{ConfigLoader, StoryloomConfig};
use crate::error::StoryError;
use crate::pipeline::{evaluate_story, request_rng, StoryService};
use crate::prompt::resolve_character_name;
use crate::request::{GenerationRequest, StoryRequestPayload};
use anyhow::Context;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

/// Runtime context for CLI execution: loaded configuration and the directory it came from.
pub struct RunContext {
    config: StoryloomConfig,
    workdir: PathBuf,
}

impl RunContext {
    /// Create run context from a working directory and optional config path. Uses ConfigLoader only.
    pub fn new(workdir: PathBuf, config_path: Option<PathBuf>) -> Result<Self, StoryError> {
        let config = match config_path {
            Some(ref path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(&workdir)?,
        };
        Ok(Self { config, workdir })
    }

    /// Run context over an already-built configuration.
    pub fn with_config(config: StoryloomConfig, workdir: PathBuf) -> Self {
        Self { config, workdir }
    }

    pub fn config(&self) -> &StoryloomConfig {
        &self.config
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> anyhow::Result<String> {
        let started = Instant::now();
        let result = self.execute_inner(command);
        info!(
            command = command.name(),
            ok = result.is_ok(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Command finished"
        );
        result
    }

    fn execute_inner(&self, command: &Commands) -> anyhow::Result<String> {
        match command {
            Commands::Generate {
                request,
                seed,
                illustrate,
                format,
            } => self.handle_generate(request, *seed, *illustrate, format),
            Commands::Policy { format } => self.handle_policy(format),
            Commands::Score {
                request,
                story,
                character,
                seed,
                format,
            } => self.handle_score(request, story, character.as_deref(), *seed, format),
        }
    }

    fn handle_generate(
        &self,
        request_path: &Path,
        seed: Option<u64>,
        illustrate: bool,
        format: &str,
    ) -> anyhow::Result<String> {
        check_format(format)?;
        let request = self.read_request(request_path)?;

        let mut config = self.config.clone();
        if seed.is_some() {
            config.generation.seed = seed;
        }
        if illustrate {
            config.illustration.enabled = true;
        }
        let service = StoryService::from_config(&config)?;

        let runtime = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
        let story = runtime.block_on(service.generate_illustrated(&request))?;

        if format == "json" {
            Ok(format_story_json(&story)?)
        } else {
            Ok(format_story_text(
                &story,
                config.generation.retry.satisfaction_threshold,
            ))
        }
    }

    fn handle_policy(&self, format: &str) -> anyhow::Result<String> {
        check_format(format)?;
        let table = self.config.policy_table()?;
        if format == "json" {
            Ok(format_policy_json(&table)?)
        } else {
            Ok(format_policy_text(&table))
        }
    }

    fn handle_score(
        &self,
        request_path: &Path,
        story_path: &Path,
        character: Option<&str>,
        seed: Option<u64>,
        format: &str,
    ) -> anyhow::Result<String> {
        check_format(format)?;
        let request = self.read_request(request_path)?;
        let story_path = self.resolve(story_path);
        let raw_text = std::fs::read_to_string(&story_path)
            .with_context(|| format!("Failed to read story file {}", story_path.display()))?;

        let character_name = match character {
            Some(name) => name.to_string(),
            None => resolve_character_name(
                &request,
                &mut request_rng(seed.or(self.config.generation.seed)),
            ),
        };
        let table = self.config.policy_table()?;
        let (attempt, breakdown) = evaluate_story(&table, &request, &raw_text, &character_name)?;
        let threshold = self.config.generation.retry.satisfaction_threshold;

        if format == "json" {
            Ok(format_score_json(&attempt, &breakdown, threshold)?)
        } else {
            Ok(format_score_text(&attempt, &breakdown, threshold))
        }
    }

    fn read_request(&self, path: &Path) -> anyhow::Result<GenerationRequest> {
        let path = self.resolve(path);
        let body = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read request file {}", path.display()))?;
        let payload = StoryRequestPayload::from_json(&body)?;
        Ok(GenerationRequest::try_from(payload)?)
    }

    /// Relative paths are taken from the working directory.
    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workdir.join(path)
        }
    }
}

fn check_format(format: &str) -> anyhow::Result<()> {
    match format {
        "text" | "json" => Ok(()),
        other => anyhow::bail!("Unsupported output format: {} (use text or json)", other),
    }
}
