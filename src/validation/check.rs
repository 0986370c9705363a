use std::fmt;

use serde::{Deserialize, Serialize};

/// One predicate a challenge asks of the learner's repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationTest {
    pub id: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_check: Option<GitCheck>,
}

impl ValidationTest {
    pub fn new(id: impl Into<String>, description: impl Into<String>, check: GitCheck) -> Self {
        ValidationTest {
            id: id.into(),
            description: description.into(),
            git_check: Some(check),
        }
    }
}

/// `{type, value}` as authored in challenge content. The type is kept as a
/// string so that a typo in content becomes a failed test, not a load error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitCheck {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<CheckValue>,
}

impl GitCheck {
    pub fn new(kind: impl Into<String>, value: impl Into<CheckValue>) -> Self {
        GitCheck {
            kind: kind.into(),
            value: Some(value.into()),
        }
    }

    pub fn bare(kind: impl Into<String>) -> Self {
        GitCheck {
            kind: kind.into(),
            value: None,
        }
    }
}

/// Authored content also carries counts (`value: 3`); those load and are
/// judged by the check that reads them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CheckValue {
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

impl CheckValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CheckValue::Text(s) => Some(s),
            CheckValue::Bool(_) | CheckValue::Number(_) => None,
        }
    }
}

impl From<bool> for CheckValue {
    fn from(b: bool) -> Self {
        CheckValue::Bool(b)
    }
}

impl From<&str> for CheckValue {
    fn from(s: &str) -> Self {
        CheckValue::Text(s.to_string())
    }
}

impl From<String> for CheckValue {
    fn from(s: String) -> Self {
        CheckValue::Text(s)
    }
}

/// The check types the engine knows how to evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CheckKind {
    Status,
    Commit,
    Branch,
    File,
    Merged,
}

impl CheckKind {
    pub(crate) fn parse(kind: &str) -> Option<Self> {
        match kind {
            "status" => Some(CheckKind::Status),
            "commit" => Some(CheckKind::Commit),
            "branch" => Some(CheckKind::Branch),
            "file" => Some(CheckKind::File),
            "merged" => Some(CheckKind::Merged),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub test_id: String,
    pub passed: bool,
    pub message: String,
}

impl ValidationResult {
    pub(crate) fn pass(test: &ValidationTest) -> Self {
        ValidationResult {
            test_id: test.id.clone(),
            passed: true,
            message: format!("✓ {}", test.description),
        }
    }

    pub(crate) fn fail(test: &ValidationTest, reason: impl fmt::Display) -> Self {
        ValidationResult {
            test_id: test.id.clone(),
            passed: false,
            message: format!("✗ {} - {}", test.description, reason),
        }
    }
}
