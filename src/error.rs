use std::fmt;

use crate::parser::ParseError;

/// Domain failures surfaced to the learner as an error-classified result.
///
/// The `Display` output mimics the wording of real Git closely enough for
/// teaching, but callers should match on the variant, not the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    NotARepository,
    Parse(ParseError),
    UnknownCommand {
        name: String,
        suggestion: Option<String>,
    },
    UnknownSubcommand {
        name: String,
        suggestion: Option<String>,
    },
    NothingSpecified,
    PathspecNoMatch(String),
    SwitchRequiresValue(String),
    NothingToCommit {
        untracked: bool,
    },
    BranchExists(String),
    InvalidBranchName(String),
    BranchNotFound(String),
    BranchNameRequired,
    MissingBranchArgument,
    PathspecUnknownToGit(String),
    InvalidReference(String),
    CannotDeleteCurrent(String),
    NoCommitsYet(String),
    NotACommit(String),
    MergeIntoSelf(String),
    NothingToMerge,
    InvalidCount(String),
    MissingOperand(&'static str),
    NoSuchFile {
        command: &'static str,
        file: String,
    },
    Internal(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotARepository => write!(
                f,
                "fatal: not a git repository (or any of the parent directories): .git"
            ),
            Error::Parse(e) => write!(f, "{}", e),
            Error::UnknownCommand { name, suggestion } => {
                write!(
                    f,
                    "Command not found: {}\nType 'help' for available commands.",
                    name
                )?;
                if let Some(suggestion) = suggestion {
                    write!(f, "\n\nDid you mean '{}'?", suggestion)?;
                }
                Ok(())
            }
            Error::UnknownSubcommand { name, suggestion } => {
                write!(f, "git: '{}' is not a git command. See 'git --help'.", name)?;
                if let Some(suggestion) = suggestion {
                    write!(f, "\n\nThe most similar command is\n\t{}", suggestion)?;
                }
                Ok(())
            }
            Error::NothingSpecified => write!(
                f,
                "Nothing specified, nothing added.\nhint: Maybe you wanted to say 'git add .'?"
            ),
            Error::PathspecNoMatch(file) => {
                write!(f, "fatal: pathspec '{}' did not match any files", file)
            }
            Error::SwitchRequiresValue(switch) => {
                write!(f, "error: switch `{}' requires a value", switch)
            }
            Error::NothingToCommit { untracked: false } => {
                write!(f, "nothing to commit, working tree clean")
            }
            Error::NothingToCommit { untracked: true } => write!(
                f,
                "nothing to commit, untracked files present (use \"git add\" to track)"
            ),
            Error::BranchExists(name) => {
                write!(f, "fatal: a branch named '{}' already exists", name)
            }
            Error::InvalidBranchName(name) => {
                write!(f, "fatal: '{}' is not a valid branch name", name)
            }
            Error::BranchNotFound(name) => write!(f, "error: branch '{}' not found", name),
            Error::BranchNameRequired => write!(f, "fatal: branch name required"),
            Error::MissingBranchArgument => write!(f, "fatal: missing branch or commit argument"),
            Error::PathspecUnknownToGit(name) => write!(
                f,
                "error: pathspec '{}' did not match any file(s) known to git",
                name
            ),
            Error::InvalidReference(name) => write!(f, "fatal: invalid reference: {}", name),
            Error::CannotDeleteCurrent(name) => write!(
                f,
                "error: cannot delete branch '{}' checked out in the current session",
                name
            ),
            Error::NoCommitsYet(branch) => write!(
                f,
                "fatal: your current branch '{}' does not have any commits yet",
                branch
            ),
            Error::NotACommit(name) => write!(f, "fatal: '{}' does not refer to a commit", name),
            Error::MergeIntoSelf(name) => {
                write!(f, "fatal: Cannot merge branch '{}' into itself", name)
            }
            Error::NothingToMerge => write!(f, "fatal: no commits yet, nothing to merge"),
            Error::InvalidCount(value) => {
                write!(f, "fatal: '{}': not an integer", value)
            }
            Error::MissingOperand(command) => write!(f, "{}: missing file operand", command),
            Error::NoSuchFile { command, file } => {
                write!(f, "{}: {}: No such file or directory", command, file)
            }
            Error::Internal(msg) => write!(f, "error: internal simulator failure: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        Error::Parse(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_a_repository_wording() {
        let text = Error::NotARepository.to_string();
        assert!(text.starts_with("fatal:"));
        assert!(text.contains("not a git repository"));
    }

    #[test]
    fn test_unknown_subcommand_with_suggestion() {
        let err = Error::UnknownSubcommand {
            name: "comit".to_string(),
            suggestion: Some("commit".to_string()),
        };
        let text = err.to_string();
        assert!(text.contains("'comit' is not a git command"));
        assert!(text.ends_with("\tcommit"));
    }

    #[test]
    fn test_nothing_to_commit_variants() {
        assert_eq!(
            Error::NothingToCommit { untracked: false }.to_string(),
            "nothing to commit, working tree clean"
        );
        assert!(Error::NothingToCommit { untracked: true }
            .to_string()
            .contains("untracked files present"));
    }
}
