use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::validation::ValidationTest;

/// A lesson: the files the learner starts with, the checks that decide
/// completion, and progressively more specific hints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Challenge {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub instructions: String,
    #[serde(default)]
    pub starting_files: Vec<FileNode>,
    #[serde(default)]
    pub expected_commands: Vec<String>,
    #[serde(default)]
    pub validation_tests: Vec<ValidationTest>,
    #[serde(default)]
    pub hints: Vec<Hint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution: Option<Solution>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    File,
    Directory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileNode {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FileKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FileNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hint {
    pub id: String,
    /// 1 is the vaguest
    pub level: u32,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Solution {
    pub commands: Vec<String>,
    #[serde(default)]
    pub explanation: String,
}

impl Challenge {
    /// Load a challenge from a `.json` file, or YAML for any other extension.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read challenge file: {:?}", path))?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let challenge = if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_yaml_str(&content)
        }
        .with_context(|| format!("Failed to parse challenge file: {:?}", path))?;

        tracing::info!(id = %challenge.id, "loaded challenge {:?}", challenge.title);
        Ok(challenge)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("Invalid challenge YAML")
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("Invalid challenge JSON")
    }

    /// Paths of every starting file, directories flattened into
    /// `dir/name` form. Directories themselves are not listed.
    pub fn starting_file_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        collect_files(&self.starting_files, "", &mut names);
        names
    }

    /// Hints from vaguest to most specific.
    pub fn hints_in_order(&self) -> Vec<&Hint> {
        let mut hints: Vec<&Hint> = self.hints.iter().collect();
        hints.sort_by_key(|h| h.level);
        hints
    }
}

fn collect_files(nodes: &[FileNode], prefix: &str, out: &mut Vec<String>) {
    for node in nodes {
        let path = format!("{}{}", prefix, node.name);
        match node.kind {
            FileKind::File => out.push(path),
            FileKind::Directory => collect_files(&node.children, &format!("{}/", path), out),
        }
    }
}
