use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Message recorded when a commit is created with an empty message.
pub const PLACEHOLDER_MESSAGE: &str = "No commit message";

/// An immutable entry in the commit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commit {
    /// 40 hex chars, random rather than content-addressed
    pub hash: String,
    pub message: String,
    pub author: String,
    pub timestamp: DateTime<Utc>,
    /// Empty for the root commit, two entries for a merge
    #[serde(default)]
    pub parents: Vec<String>,
    /// Filenames that were staged when the commit was made
    #[serde(default)]
    pub files: Vec<String>,
}

impl Commit {
    pub(crate) fn new(
        hash: String,
        message: &str,
        author: &str,
        parents: Vec<String>,
        files: Vec<String>,
    ) -> Self {
        let message = message.trim();
        let message = if message.is_empty() {
            PLACEHOLDER_MESSAGE
        } else {
            message
        };

        Commit {
            hash,
            message: message.to_string(),
            author: author.to_string(),
            timestamp: Utc::now(),
            parents,
            files,
        }
    }

    /// Abbreviated hash as shown by `git log --oneline`.
    pub fn short_hash(&self) -> &str {
        let end = self.hash.len().min(7);
        &self.hash[..end]
    }

    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }
}

/// Generate a random commit hash for which `taken` returns false.
pub(crate) fn generate_hash<F>(taken: F) -> String
where
    F: Fn(&str) -> bool,
{
    let mut rng = rand::thread_rng();
    loop {
        let bytes: [u8; 20] = rng.gen();
        let hash = hex::encode(bytes);
        if !taken(&hash) {
            return hash;
        }
    }
}
