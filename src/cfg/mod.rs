use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Tool-level settings, kept separate from the per-directory `.sync`
/// descriptors. Currently just the storage root that `name`-style
/// descriptors resolve against.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Directory that descriptor `name`s are joined against. Tilde is
    /// expanded at resolution time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_root: Option<String>,
}

pub fn default_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Failed to find home directory")?;
    Ok(home.join(".foldsync").join("config.toml"))
}

/// A missing config file behaves as an empty config rather than an error;
/// descriptors with explicit targets need no configuration at all.
pub fn load(config_path: &Path) -> Result<Config> {
    if !config_path.exists() {
        return Ok(Config::default());
    }
    let contents = fs::read_to_string(config_path).context("Failed to read config file")?;
    let config: Config = toml::from_str(&contents).context("Failed to parse config file")?;
    Ok(config)
}

pub fn save(config_path: &Path, config: &Config) -> Result<()> {
    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent).context("Failed to create config directory")?;
    }
    let toml_string = toml::to_string_pretty(config).context("Failed to serialize config")?;
    fs::write(config_path, toml_string).context("Failed to write config file")?;
    Ok(())
}

pub fn edit(config_path: &Path) -> Result<()> {
    if !config_path.exists() {
        save(config_path, &Config::default())?;
    }
    let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());

    Command::new(editor)
        .arg(config_path)
        .status()
        .context("Failed to open editor")?;

    Ok(())
}
