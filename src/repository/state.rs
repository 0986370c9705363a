use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::commit::{generate_hash, Commit};
use crate::error::Error;

/// The simulated repository of one learner session.
///
/// Invariants held by every mutator:
/// - a filename is never both staged and in the working directory
/// - branch names are unique and `current_branch` is one of them once
///   initialized
/// - commit hashes are never reused
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryState {
    initialized: bool,
    current_branch: String,
    /// Insertion order is the listing order
    branches: Vec<String>,
    /// branch -> commit hash the branch last pointed at
    #[serde(default)]
    branch_tips: BTreeMap<String, String>,
    commits: Vec<Commit>,
    staging_area: Vec<String>,
    working_directory: Vec<String>,
    /// Hash of the most recent commit, empty before the first one
    head: String,
    /// Branch created by `init`; merges into it omit " into <branch>"
    #[serde(default)]
    default_branch: String,
}

impl RepositoryState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn current_branch(&self) -> &str {
        &self.current_branch
    }

    pub fn branches(&self) -> &[String] {
        &self.branches
    }

    pub fn has_branch(&self, name: &str) -> bool {
        self.branches.iter().any(|b| b == name)
    }

    pub fn branch_tip(&self, name: &str) -> Option<&str> {
        self.branch_tips.get(name).map(String::as_str)
    }

    pub fn commits(&self) -> &[Commit] {
        &self.commits
    }

    pub fn find_commit(&self, hash: &str) -> Option<&Commit> {
        self.commits.iter().find(|c| c.hash == hash)
    }

    pub fn staging_area(&self) -> &[String] {
        &self.staging_area
    }

    pub fn working_directory(&self) -> &[String] {
        &self.working_directory
    }

    pub fn head(&self) -> Option<&str> {
        if self.head.is_empty() {
            None
        } else {
            Some(&self.head)
        }
    }

    /// Whether the file appears in any commit.
    pub fn is_tracked(&self, file: &str) -> bool {
        self.commits
            .iter()
            .any(|c| c.files.iter().any(|f| f == file))
    }

    /// Every filename the session knows about: committed, staged, or in the
    /// working directory, each listed once.
    pub fn known_files(&self) -> Vec<&str> {
        let mut files: Vec<&str> = Vec::new();
        let committed = self.commits.iter().flat_map(|c| c.files.iter());
        for file in committed
            .chain(self.staging_area.iter())
            .chain(self.working_directory.iter())
        {
            if !files.contains(&file.as_str()) {
                files.push(file);
            }
        }
        files
    }

    pub fn is_known_file(&self, file: &str) -> bool {
        self.staging_area.iter().any(|f| f == file)
            || self.working_directory.iter().any(|f| f == file)
            || self.is_tracked(file)
    }

    /// Initialize the repository. Returns false when it already was, in which
    /// case nothing changes.
    pub fn init(&mut self, default_branch: &str) -> bool {
        if self.initialized {
            return false;
        }
        self.initialized = true;
        self.current_branch = default_branch.to_string();
        self.default_branch = default_branch.to_string();
        if !self.has_branch(default_branch) {
            self.branches.push(default_branch.to_string());
        }
        true
    }

    /// Register a new file in the working directory, as `touch` does.
    /// Files the session already knows about are left alone.
    pub fn touch_file(&mut self, name: &str) -> bool {
        if self.is_known_file(name) {
            return false;
        }
        self.working_directory.push(name.to_string());
        true
    }

    /// Record a write to `name`. A committed file becomes modified; a staged
    /// file stays staged.
    pub fn write_file(&mut self, name: &str) -> bool {
        let staged = self.staging_area.iter().any(|f| f == name);
        let unstaged = self.working_directory.iter().any(|f| f == name);
        if staged || unstaged {
            return false;
        }
        self.working_directory.push(name.to_string());
        true
    }

    /// Move the named files into the staging area.
    ///
    /// Every path must be known; nothing is staged if one of them is not.
    /// Returns the files that were newly staged.
    pub fn stage(&mut self, paths: &[String]) -> Result<Vec<String>, Error> {
        if let Some(unknown) = paths.iter().find(|p| !self.is_known_file(p)) {
            return Err(Error::PathspecNoMatch(unknown.clone()));
        }

        let mut staged = Vec::new();
        for path in paths {
            if let Some(pos) = self.working_directory.iter().position(|f| f == path) {
                let file = self.working_directory.remove(pos);
                self.staging_area.push(file.clone());
                staged.push(file);
            }
        }
        Ok(staged)
    }

    /// Stage the whole working directory.
    pub fn stage_all(&mut self) -> Vec<String> {
        let files = std::mem::take(&mut self.working_directory);
        self.staging_area.extend(files.iter().cloned());
        files
    }

    /// Create a commit from the staging area and advance HEAD and the
    /// current branch.
    pub fn commit(&mut self, message: &str, author: &str) -> Result<&Commit, Error> {
        if self.staging_area.is_empty() {
            return Err(Error::NothingToCommit {
                untracked: !self.working_directory.is_empty(),
            });
        }

        let parents = self.head().map(|h| vec![h.to_string()]).unwrap_or_default();
        let files = std::mem::take(&mut self.staging_area);
        let hash = self.fresh_hash();
        Ok(self.push_commit(Commit::new(hash, message, author, parents, files)))
    }

    /// Validate and create a branch at HEAD without switching to it.
    pub fn create_branch(&mut self, name: &str) -> Result<(), Error> {
        if !is_valid_branch_name(name) {
            return Err(Error::InvalidBranchName(name.to_string()));
        }
        if self.has_branch(name) {
            return Err(Error::BranchExists(name.to_string()));
        }
        self.branches.push(name.to_string());
        if let Some(head) = self.head().map(str::to_string) {
            self.branch_tips.insert(name.to_string(), head);
        }
        Ok(())
    }

    /// Delete a branch other than the current one, returning its last tip.
    pub fn delete_branch(&mut self, name: &str) -> Result<Option<String>, Error> {
        if !self.has_branch(name) {
            return Err(Error::BranchNotFound(name.to_string()));
        }
        if name == self.current_branch {
            return Err(Error::CannotDeleteCurrent(name.to_string()));
        }
        self.branches.retain(|b| b != name);
        Ok(self.branch_tips.remove(name))
    }

    /// Make `name` the current branch. Returns false if it already was.
    pub fn switch_branch(&mut self, name: &str) -> Result<bool, Error> {
        if !self.has_branch(name) {
            return Err(Error::InvalidReference(name.to_string()));
        }
        if name == self.current_branch {
            return Ok(false);
        }
        self.current_branch = name.to_string();
        Ok(true)
    }

    /// Record a merge of `branch` into the current branch as a two-parent
    /// commit: the current HEAD and the tip of `branch` (HEAD when the branch
    /// never received a commit of its own).
    pub fn merge(&mut self, branch: &str, author: &str) -> Result<&Commit, Error> {
        if !self.has_branch(branch) {
            return Err(Error::NotACommit(branch.to_string()));
        }
        if branch == self.current_branch {
            return Err(Error::MergeIntoSelf(branch.to_string()));
        }
        let head = self.head().map(str::to_string).ok_or(Error::NothingToMerge)?;
        let theirs = self
            .branch_tip(branch)
            .map(str::to_string)
            .unwrap_or_else(|| head.clone());

        let message = if self.current_branch == self.default_branch {
            format!("Merge branch '{}'", branch)
        } else {
            format!("Merge branch '{}' into {}", branch, self.current_branch)
        };
        let hash = self.fresh_hash();
        Ok(self.push_commit(Commit::new(
            hash,
            &message,
            author,
            vec![head, theirs],
            Vec::new(),
        )))
    }

    fn fresh_hash(&self) -> String {
        generate_hash(|candidate| self.commits.iter().any(|c| c.hash == candidate))
    }

    fn push_commit(&mut self, commit: Commit) -> &Commit {
        self.head = commit.hash.clone();
        self.branch_tips
            .insert(self.current_branch.clone(), commit.hash.clone());
        self.commits.push(commit);
        let last = self.commits.len() - 1;
        &self.commits[last]
    }
}

/// A reduced `git check-ref-format --branch`.
fn is_valid_branch_name(name: &str) -> bool {
    const FORBIDDEN: &[char] = &['~', '^', ':', '?', '*', '[', '\\'];

    !name.is_empty()
        && !name.starts_with('-')
        && !name.starts_with('/')
        && !name.ends_with('/')
        && !name.ends_with('.')
        && !name.ends_with(".lock")
        && !name.contains("..")
        && !name.contains("@{")
        && !name.contains("//")
        && name != "HEAD"
        && !name.chars().any(|c| c.is_whitespace() || c.is_control())
        && !name.contains(FORBIDDEN)
}
