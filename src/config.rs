//! Configuration loading and management
//!
//! Handles parsing of `.canopy.toml` configuration files.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Name of the project configuration file
pub const CONFIG_FILENAME: &str = ".canopy.toml";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Project display name
    #[serde(default = "default_project_name")]
    pub project: String,

    /// Default season used by `canopy schedule` when `--season` is absent
    #[serde(default = "default_season")]
    pub season: String,

    /// Actor configuration
    #[serde(default)]
    pub actor: ActorConfig,

    /// Task configuration
    #[serde(default)]
    pub tasks: TasksConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project: default_project_name(),
            season: default_season(),
            actor: ActorConfig::default(),
            tasks: TasksConfig::default(),
        }
    }
}

fn default_project_name() -> String {
    "afforestation".to_string()
}

fn default_season() -> String {
    "rainy".to_string()
}

/// Actor-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorConfig {
    /// Default actor name when none specified
    #[serde(default = "default_actor")]
    pub default: String,
}

fn default_actor() -> String {
    "unknown".to_string()
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            default: default_actor(),
        }
    }
}

/// Task-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasksConfig {
    /// Prefix for generated task ids
    #[serde(default = "default_id_prefix")]
    pub id_prefix: String,

    /// Minimum length of the random task-id suffix
    #[serde(default = "default_id_min_len")]
    pub id_min_len: usize,
}

fn default_id_prefix() -> String {
    "mt".to_string()
}

fn default_id_min_len() -> usize {
    3
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            id_prefix: default_id_prefix(),
            id_min_len: default_id_min_len(),
        }
    }
}

impl Config {
    /// Load configuration from a specific file path
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from a project root, falling back to defaults
    /// when the file is missing or unreadable.
    pub fn load_from_project(project_root: &PathBuf) -> Self {
        let path = project_root.join(CONFIG_FILENAME);
        if !path.exists() {
            return Config::default();
        }
        Config::load(&path).unwrap_or_default()
    }
}
