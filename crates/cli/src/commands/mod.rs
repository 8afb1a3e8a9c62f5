pub mod config_cmd;
pub mod run;
pub mod tools;

use anyhow::Context;
use std::path::Path;
use steward_config::AppConfig;

/// Load `path` if given, otherwise the default location, with env overrides.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    match path {
        Some(path) => {
            let mut config = AppConfig::load_from(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?;
            config.apply_env_overrides(|key| std::env::var(key).ok());
            Ok(config)
        }
        None => AppConfig::load().context("Failed to load config"),
    }
}
