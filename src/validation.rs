//! Declarative checks of a repository against what a challenge expects.
//!
//! Evaluation only reads the state. Every check fails closed: content
//! mistakes and uninitialized repositories produce failed results, never
//! errors.

mod check;

use crate::repository::RepositoryState;

use check::CheckKind;
pub use check::{CheckValue, GitCheck, ValidationResult, ValidationTest};

const NOT_INITIALIZED: &str = "Repository not initialized";

pub struct ValidationEngine<'a> {
    state: &'a RepositoryState,
}

impl<'a> ValidationEngine<'a> {
    pub fn new(state: &'a RepositoryState) -> Self {
        ValidationEngine { state }
    }

    /// Evaluate each test in order.
    pub fn validate(&self, tests: &[ValidationTest]) -> Vec<ValidationResult> {
        let results: Vec<ValidationResult> = tests.iter().map(|t| self.run_test(t)).collect();
        tracing::debug!(
            total = results.len(),
            passed = results.iter().filter(|r| r.passed).count(),
            "validation pass"
        );
        results
    }

    fn run_test(&self, test: &ValidationTest) -> ValidationResult {
        let Some(check) = &test.git_check else {
            return ValidationResult::fail(test, "No validation criteria specified");
        };
        let Some(kind) = CheckKind::parse(&check.kind) else {
            return ValidationResult::fail(
                test,
                format!("Unknown test type '{}'", check.kind),
            );
        };

        if kind != CheckKind::Status && !self.state.is_initialized() {
            return ValidationResult::fail(test, NOT_INITIALIZED);
        }

        let value = check.value.as_ref();
        let outcome = match kind {
            CheckKind::Status => self.check_status(value),
            CheckKind::Commit => self.check_commit(value.and_then(CheckValue::as_text)),
            CheckKind::Branch => self.check_branch(value.and_then(CheckValue::as_text)),
            CheckKind::File => self.check_file(value.and_then(CheckValue::as_text)),
            CheckKind::Merged => match value {
                None | Some(CheckValue::Bool(true)) => self.check_merged(None),
                Some(CheckValue::Text(branch)) => self.check_merged(Some(branch.as_str())),
                Some(_) => Err("Unknown merged check".to_string()),
            },
        };

        match outcome {
            Ok(()) => ValidationResult::pass(test),
            Err(reason) => ValidationResult::fail(test, reason),
        }
    }

    fn check_status(&self, value: Option<&CheckValue>) -> Result<(), String> {
        let state = self.state;
        match value {
            Some(CheckValue::Bool(true)) => self.require_initialized(),
            Some(CheckValue::Text(t)) if t == "initialized" => self.require_initialized(),
            Some(CheckValue::Text(t)) if t == "clean" => {
                self.require_initialized()?;
                if state.staging_area().is_empty() && state.working_directory().is_empty() {
                    Ok(())
                } else {
                    Err("Working tree has uncommitted changes. Check 'git status'.".to_string())
                }
            }
            _ => Err("Unknown status check".to_string()),
        }
    }

    fn require_initialized(&self) -> Result<(), String> {
        if self.state.is_initialized() {
            Ok(())
        } else {
            Err("Repository not initialized. Run 'git init' first.".to_string())
        }
    }

    fn check_commit(&self, needle: Option<&str>) -> Result<(), String> {
        let commits = self.state.commits();
        let Some(needle) = needle else {
            return if commits.is_empty() {
                Err("No commits found. Use 'git commit -m \"message\"' to create a commit."
                    .to_string())
            } else {
                Ok(())
            };
        };

        let lowered = needle.to_lowercase();
        if commits
            .iter()
            .any(|c| c.message.to_lowercase().contains(&lowered))
        {
            return Ok(());
        }

        let yours: Vec<String> = commits.iter().map(|c| format!("\"{}\"", c.message)).collect();
        Err(format!(
            "No commit found with \"{}\" in the message. Your commits: {}",
            needle,
            none_if_empty(&yours.join(", "))
        ))
    }

    fn check_branch(&self, name: Option<&str>) -> Result<(), String> {
        let branches = self.state.branches();
        let Some(name) = name else {
            return if branches.len() > 1 {
                Ok(())
            } else {
                Err("Only one branch exists".to_string())
            };
        };

        if branches.iter().any(|b| b.eq_ignore_ascii_case(name)) {
            Ok(())
        } else {
            Err(format!(
                "Branch \"{}\" not found. Available branches: {}",
                name,
                none_if_empty(&branches.join(", "))
            ))
        }
    }

    fn check_file(&self, name: Option<&str>) -> Result<(), String> {
        match name {
            Some(name) if self.state.is_known_file(name) => Ok(()),
            Some(name) => Err(format!("File \"{}\" not found", name)),
            None if self.state.known_files().is_empty() => Err("No files found".to_string()),
            None => Ok(()),
        }
    }

    fn check_merged(&self, branch: Option<&str>) -> Result<(), String> {
        let mut merges = self.state.commits().iter().filter(|c| c.is_merge());
        let found = match branch {
            Some(branch) => {
                let quoted = format!("'{}'", branch);
                merges.any(|c| c.message.contains(&quoted))
            }
            None => merges.next().is_some(),
        };

        if found {
            return Ok(());
        }
        match branch {
            Some(branch) => Err(format!(
                "No merge of '{}' detected. Use 'git merge {}' to merge it.",
                branch, branch
            )),
            None => Err(
                "No merge detected. Use 'git merge <branch>' to merge branches.".to_string(),
            ),
        }
    }
}

fn none_if_empty(list: &str) -> &str {
    if list.is_empty() {
        "none"
    } else {
        list
    }
}

/// Whether every result passed. An empty list passes.
pub fn all_tests_passed(results: &[ValidationResult]) -> bool {
    results.iter().all(|r| r.passed)
}

pub fn failed_tests(results: &[ValidationResult]) -> Vec<&ValidationResult> {
    results.iter().filter(|r| !r.passed).collect()
}
