//! MergeService: orchestrates sources, applies merge policy, deserializes to RoConfig.

use crate::config::sources::{environment, global_file, workspace_file};
use crate::config::RoConfig;
use config::{ConfigError, File};
use std::path::Path;
use tracing::debug;

use super::merge_policy;

/// Merge service for config composition.
pub struct MergeService;

impl MergeService {
    /// Load config from workspace and standard sources.
    /// Precedence: global file (lowest) -> workspace base -> workspace env -> environment (highest).
    pub fn load(workspace_root: &Path) -> Result<RoConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = environment::add_to_builder(builder)?;

        let config: RoConfig = builder.build()?.try_deserialize()?;
        debug!(workspace = %workspace_root.display(), "Loaded configuration");
        Ok(config.with_workspace(workspace_root))
    }

    /// Load config from a specific file with environment overlay.
    ///
    /// A relative root is resolved against the file's directory.
    pub fn load_from_file(path: &Path) -> Result<RoConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = builder.add_source(File::from(path));
        let builder = environment::add_to_builder(builder)?;

        let config: RoConfig = builder.build()?.try_deserialize()?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Ok(config.with_workspace(base))
    }
}
