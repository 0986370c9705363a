use std::{
    env,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::parser::WhitespacePolicy;

/// Expand tilde (~) in path to user's home directory
fn expand_tilde(path: &Path) -> PathBuf {
    if let Some(s) = path.to_str() {
        if let Some(stripped) = s.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(stripped);
            }
        } else if s == "~" {
            if let Some(home) = dirs::home_dir() {
                return home;
            }
        }
    }
    path.to_path_buf()
}

/// Per-session settings for the simulator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulatorConfig {
    /// Identity stamped on every commit
    #[serde(default = "defaults::author")]
    pub author: String,
    /// Branch created by `git init`
    #[serde(default = "defaults::default_branch")]
    pub default_branch: String,
    /// Reject commands containing runs of whitespace instead of collapsing them
    #[serde(default)]
    pub strict_whitespace: bool,
    /// What `pwd` prints
    #[serde(default = "defaults::workspace_label")]
    pub workspace_label: String,
    /// Where exported session scripts are written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_dir: Option<PathBuf>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        SimulatorConfig {
            author: defaults::author(),
            default_branch: defaults::default_branch(),
            strict_whitespace: false,
            workspace_label: defaults::workspace_label(),
            export_dir: None,
        }
    }
}

impl SimulatorConfig {
    /// Load configuration from the default config file and the process
    /// environment
    pub fn load() -> Result<Self> {
        let config_path = Self::config_file_path()?;
        Self::load_from(Some(&config_path))
    }

    /// Load configuration from `path` (defaults when absent or missing), then
    /// apply environment overrides
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) if path.exists() => {
                tracing::debug!("loading git-sim config from {:?}", path);
                Self::load_from_file(path)?
            }
            Some(path) => {
                tracing::debug!("no config file at {:?}, using defaults", path);
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_env_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let mut config: SimulatorConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        if let Some(ref export_dir) = config.export_dir {
            config.export_dir = Some(expand_tilde(export_dir));
        }

        Ok(config)
    }

    /// Apply `GIT_SIM_*` overrides using `lookup` to read variables
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(author) = lookup("GIT_SIM_AUTHOR") {
            self.author = author;
        }

        if let Some(branch) = lookup("GIT_SIM_DEFAULT_BRANCH") {
            self.default_branch = branch;
        }

        if let Some(strict) = lookup("GIT_SIM_STRICT_WHITESPACE") {
            self.strict_whitespace = parse_bool(&strict)
                .with_context(|| "Failed to parse GIT_SIM_STRICT_WHITESPACE as a boolean")?;
        }

        if let Some(label) = lookup("GIT_SIM_WORKSPACE_LABEL") {
            self.workspace_label = label;
        }

        if let Some(dir) = lookup("GIT_SIM_EXPORT_DIR") {
            self.export_dir = Some(expand_tilde(&PathBuf::from(dir)));
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        // Ensure directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        Ok(())
    }

    /// Get default config file path
    pub fn config_file_path() -> Result<PathBuf> {
        dirs::home_dir()
            .map(|home| home.join(".config/git-sim/config.yaml"))
            .context("Could not determine home directory for config file")
    }

    pub fn whitespace_policy(&self) -> WhitespacePolicy {
        if self.strict_whitespace {
            WhitespacePolicy::Strict
        } else {
            WhitespacePolicy::Lenient
        }
    }

    /// Default destination for an exported session script
    pub fn export_path(&self) -> Option<PathBuf> {
        self.export_dir.as_ref().map(|dir| dir.join("session.sh"))
    }

    fn validate(&self) -> Result<()> {
        if self.author.trim().is_empty() {
            anyhow::bail!("author must not be empty");
        }
        if self.default_branch.trim().is_empty()
            || self.default_branch.chars().any(char::is_whitespace)
        {
            anyhow::bail!("invalid default_branch: {:?}", self.default_branch);
        }
        Ok(())
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("expected a boolean, got {:?}", other),
    }
}

mod defaults {
    pub(crate) fn author() -> String {
        "Student".to_string()
    }

    pub(crate) fn default_branch() -> String {
        "main".to_string()
    }

    pub(crate) fn workspace_label() -> String {
        "~/project".to_string()
    }
}
