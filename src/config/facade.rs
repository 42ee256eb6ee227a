//! Config loader facade: assembles sources in merge order and deserializes.

use super::merge::merge_policy;
use super::sources::{global_file, workspace_file};
use super::StoryloomConfig;
use config::{ConfigError, File};
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for `workdir`: defaults, global file, workspace
    /// files, then environment overrides.
    pub fn load(workdir: &Path) -> Result<StoryloomConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workdir)?;
        let builder = merge_policy::with_environment(builder);

        let config: StoryloomConfig = builder.build()?.try_deserialize()?;
        debug!(workdir = %workdir.display(), "Configuration loaded");
        Ok(config)
    }

    /// Load configuration from a single file, still honoring environment overrides.
    pub fn load_from_file(path: &Path) -> Result<StoryloomConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?
            .add_source(File::from(path.to_path_buf()).required(true));
        let builder = merge_policy::with_environment(builder);
        builder.build()?.try_deserialize()
    }

    /// Location of the user's global config file, if a home directory is known.
    pub fn global_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }
}
