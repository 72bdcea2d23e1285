use anyhow::{Context, Result};
use std::path::PathBuf;

/// `~/.sure-cli`; not created here, the CLI only reads from it.
pub fn sure_home() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".sure-cli"))
}

pub fn config_path() -> Result<PathBuf> {
    Ok(sure_home()?.join("config.toml"))
}
