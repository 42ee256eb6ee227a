//! Workspace config file source: config/config.toml and config/{env}.toml

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File};
use std::path::Path;

/// Selects the environment-specific file, e.g. `config/production.toml`.
pub const ENV_NAME_VAR: &str = "STORYLOOM_ENV";

/// Add workspace config files to builder.
/// Precedence: config/config.toml (base) then config/{STORYLOOM_ENV}.toml (env-specific).
pub fn add_to_builder(
    mut builder: ConfigBuilder<DefaultState>,
    workdir: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let config_dir = workdir.join("config");
    let env_name = std::env::var(ENV_NAME_VAR).unwrap_or_else(|_| "development".to_string());

    let base_config_path = config_dir.join("config.toml");
    if base_config_path.exists() {
        builder = builder.add_source(File::from(base_config_path).required(false));
    }

    let env_config_path = config_dir.join(format!("{}.toml", env_name));
    if env_config_path.exists() {
        builder = builder.add_source(File::from(env_config_path).required(false));
    }

    Ok(builder)
}
