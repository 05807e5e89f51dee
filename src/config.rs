//! Configuration file support for trailmap
//!
//! Reads from .trailmap/config.toml, discovered by walking up the directory
//! tree from the current directory. Every key has a default, so a missing or
//! unparseable file means default behavior rather than an error.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub backup: BackupConfig,

    /// GitHub settings for project repository snapshots
    #[serde(default)]
    pub github: GithubConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    /// Port the API server binds on localhost
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BackupConfig {
    /// Timestamped backup directories kept after pruning
    #[serde(default = "default_retain")]
    pub retain: usize,
}

#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct GithubConfig {
    /// Personal access token for the snapshot fetch. Raises the rate limit;
    /// anonymous requests work for public repositories.
    #[serde(default)]
    pub token: Option<String>,
}

fn default_port() -> u16 {
    4400
}

fn default_retain() -> usize {
    7
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            retain: default_retain(),
        }
    }
}

impl Config {
    /// Load config from .trailmap/config.toml
    /// Returns default config if file doesn't exist
    pub fn load() -> Self {
        if let Some(path) = Self::find_config_path() {
            if let Ok(contents) = std::fs::read_to_string(&path) {
                if let Ok(config) = toml::from_str(&contents) {
                    return config;
                }
            }
        }
        Self::default()
    }

    /// Find config.toml by walking up directory tree
    fn find_config_path() -> Option<PathBuf> {
        let current_dir = std::env::current_dir().ok()?;
        let mut dir = current_dir.as_path();

        loop {
            let config_path = dir.join(".trailmap").join("config.toml");
            if config_path.exists() {
                return Some(config_path);
            }

            match dir.parent() {
                Some(parent) => dir = parent,
                None => break,
            }
        }
        None
    }
}
