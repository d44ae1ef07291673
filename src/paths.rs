//! Common paths for BookSwap data storage
//!
//! All BookSwap data is stored under ~/.config/bookswap/ on all platforms:
//! - config.toml - User configuration
//! - session.enc - Encrypted authentication session

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// Get the BookSwap data directory (~/.config/bookswap/)
pub fn bookswap_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    let dir = home.join(".config").join("bookswap");
    fs::create_dir_all(&dir).context("Failed to create bookswap directory")?;
    Ok(dir)
}

/// Get the config file path (~/.config/bookswap/config.toml)
pub fn config_path() -> Result<PathBuf> {
    Ok(bookswap_dir()?.join("config.toml"))
}

/// Get the session file path (~/.config/bookswap/session.enc)
pub fn session_path() -> Result<PathBuf> {
    Ok(bookswap_dir()?.join("session.enc"))
}
