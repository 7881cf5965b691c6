//! Merge rules: defaults, override order, conflict handling.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("root", ".")?
        .set_default("url", crate::engine::DEFAULT_URL)?
        .set_default("cache.enabled", false)?
        .set_default("cache.backend", "memory")?
        .set_default("cache.path", ".ro/cache")
}
