//! `steward config`: print the effective configuration.

use std::path::Path;
use steward_config::AppConfig;

pub fn show(config_path: Option<&Path>, default: bool) -> anyhow::Result<()> {
    if default {
        println!("{}", AppConfig::default_toml());
        return Ok(());
    }

    let config = super::load_config(config_path)?;
    let source = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"));
    println!("# {}", source.display());
    println!("{}", config.redacted_toml());
    Ok(())
}
