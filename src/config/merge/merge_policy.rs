//! Merge rules: defaults, override order, conflict handling.
//!
//! Later sources win key by key: defaults, global file, workspace base file,
//! workspace environment file, then `STORYLOOM__*` environment variables.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment};

/// Prefix for environment overrides, e.g. `STORYLOOM__GENERATION__TIMEOUT_SECS`.
pub const ENV_PREFIX: &str = "STORYLOOM";
const ENV_SEPARATOR: &str = "__";

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("generation.temperature", 0.8)?
        .set_default("generation.timeout_secs", 45)?
        .set_default("generation.retry.max_attempts", 3)?
        .set_default("generation.retry.satisfaction_threshold", 85)
}

/// Environment variables are the highest-precedence layer.
pub fn with_environment(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator(ENV_SEPARATOR)
            .separator(ENV_SEPARATOR)
            .try_parsing(true),
    )
}
