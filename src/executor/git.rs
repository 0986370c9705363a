use std::fmt::Write as _;

use super::CommandResult;
use crate::{
    config::SimulatorConfig,
    error::Error,
    parser::{FlagValue, ParsedCommand},
    repository::{Commit, RepositoryState},
    suggest,
};

const USAGE: &str = "usage: git <command> [<args>]

Common Git commands:
   init       Create an empty Git repository
   status     Show the working tree status
   add        Add file contents to the index
   commit     Record changes to the repository
   branch     List, create, or delete branches
   checkout   Switch branches
   switch     Switch branches
   log        Show commit logs
   merge      Join development histories together";

/// Git subcommands the simulator understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subcommand {
    Help,
    Version,
    Init,
    Status,
    Add,
    Commit,
    Branch,
    Checkout,
    Switch,
    Log,
    Merge,
}

impl Subcommand {
    pub const ALL: [Subcommand; 11] = [
        Subcommand::Help,
        Subcommand::Version,
        Subcommand::Init,
        Subcommand::Status,
        Subcommand::Add,
        Subcommand::Commit,
        Subcommand::Branch,
        Subcommand::Checkout,
        Subcommand::Switch,
        Subcommand::Log,
        Subcommand::Merge,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Subcommand::Help => "help",
            Subcommand::Version => "version",
            Subcommand::Init => "init",
            Subcommand::Status => "status",
            Subcommand::Add => "add",
            Subcommand::Commit => "commit",
            Subcommand::Branch => "branch",
            Subcommand::Checkout => "checkout",
            Subcommand::Switch => "switch",
            Subcommand::Log => "log",
            Subcommand::Merge => "merge",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "--help" | "-h" => Some(Subcommand::Help),
            "--version" => Some(Subcommand::Version),
            _ => Self::ALL.into_iter().find(|s| s.name() == name),
        }
    }

    fn requires_repository(self) -> bool {
        !matches!(
            self,
            Subcommand::Help | Subcommand::Version | Subcommand::Init
        )
    }
}

pub(super) fn run(
    parsed: &ParsedCommand,
    repo: &mut RepositoryState,
    config: &SimulatorConfig,
) -> Result<CommandResult, Error> {
    let Some(name) = parsed.subcommand.as_deref() else {
        return Ok(CommandResult::output(USAGE));
    };
    let subcommand = Subcommand::from_name(name).ok_or_else(|| Error::UnknownSubcommand {
        name: name.to_string(),
        suggestion: similar_subcommand(name),
    })?;

    if subcommand.requires_repository() && !repo.is_initialized() {
        return Err(Error::NotARepository);
    }

    match subcommand {
        Subcommand::Help => Ok(CommandResult::output(USAGE)),
        Subcommand::Version => Ok(CommandResult::output(concat!(
            "git version ",
            env!("CARGO_PKG_VERSION"),
            " (simulated)"
        ))),
        Subcommand::Init => init(repo, config),
        Subcommand::Status => Ok(CommandResult::output(render_status(repo))),
        Subcommand::Add => add(parsed, repo),
        Subcommand::Commit => commit(parsed, repo, config),
        Subcommand::Branch => branch(parsed, repo),
        Subcommand::Checkout => checkout(parsed, repo, SwitchStyle::Checkout),
        Subcommand::Switch => checkout(parsed, repo, SwitchStyle::Switch),
        Subcommand::Log => log(parsed, repo),
        Subcommand::Merge => merge(parsed, repo, config),
    }
}

fn similar_subcommand(name: &str) -> Option<String> {
    let names: Vec<&str> = Subcommand::ALL.iter().map(|s| s.name()).collect();
    suggest::closest(name, &names).map(str::to_string)
}

fn init(repo: &mut RepositoryState, config: &SimulatorConfig) -> Result<CommandResult, Error> {
    if repo.init(&config.default_branch) {
        tracing::info!(branch = %config.default_branch, "repository initialized");
        Ok(CommandResult::success(
            "Initialized empty Git repository in .git/",
        ))
    } else {
        Ok(CommandResult::output(
            "Reinitialized existing Git repository in .git/",
        ))
    }
}

fn render_status(repo: &RepositoryState) -> String {
    let mut lines = vec![format!("On branch {}", repo.current_branch())];

    if repo.commits().is_empty() {
        lines.push(String::new());
        lines.push("No commits yet".to_string());
    }

    if !repo.staging_area().is_empty() {
        lines.push(String::new());
        lines.push("Changes to be committed:".to_string());
        lines.push("  (use \"git restore --staged <file>...\" to unstage)".to_string());
        for file in repo.staging_area() {
            let label = if repo.is_tracked(file) {
                "modified:"
            } else {
                "new file:"
            };
            lines.push(format!("\t{}   {}", label, file));
        }
    }

    let (modified, untracked): (Vec<&String>, Vec<&String>) = repo
        .working_directory()
        .iter()
        .partition(|file| repo.is_tracked(file));

    if !modified.is_empty() {
        lines.push(String::new());
        lines.push("Changes not staged for commit:".to_string());
        lines.push(
            "  (use \"git add <file>...\" to update what will be committed)".to_string(),
        );
        for file in &modified {
            lines.push(format!("\tmodified:   {}", file));
        }
    }

    if !untracked.is_empty() {
        lines.push(String::new());
        lines.push("Untracked files:".to_string());
        lines.push(
            "  (use \"git add <file>...\" to include in what will be committed)".to_string(),
        );
        for file in &untracked {
            lines.push(format!("\t{}", file));
        }
    }

    if repo.staging_area().is_empty() {
        lines.push(String::new());
        if repo.working_directory().is_empty() {
            lines.push("nothing to commit, working tree clean".to_string());
        } else {
            lines.push(
                "no changes added to commit (use \"git add\" and/or \"git commit -a\")"
                    .to_string(),
            );
        }
    }

    lines.join("\n")
}

fn add(parsed: &ParsedCommand, repo: &mut RepositoryState) -> Result<CommandResult, Error> {
    let everything = parsed.any_flag(&["A", "all"]).is_some()
        || parsed.args.iter().any(|arg| arg == "." || arg == "*");
    if everything {
        let staged = repo.stage_all();
        tracing::debug!("staged {} file(s)", staged.len());
        return Ok(CommandResult::success(""));
    }

    if parsed.args.is_empty() {
        return Err(Error::NothingSpecified);
    }

    let staged = repo.stage(&parsed.args)?;
    tracing::debug!("staged {:?}", staged);
    Ok(CommandResult::success(""))
}

fn commit(
    parsed: &ParsedCommand,
    repo: &mut RepositoryState,
    config: &SimulatorConfig,
) -> Result<CommandResult, Error> {
    let message = match parsed.any_flag(&["m", "message"]) {
        Some(FlagValue::Value(message)) => message.clone(),
        Some(FlagValue::Switch) | None => return Err(Error::SwitchRequiresValue("m".to_string())),
    };

    let branch = repo.current_branch().to_string();
    let commit = repo.commit(&message, &config.author)?;
    let root = if commit.parents.is_empty() {
        " (root-commit)"
    } else {
        ""
    };
    let changed = commit.files.len();

    Ok(CommandResult::success(format!(
        "[{}{} {}] {}\n {} file{} changed",
        branch,
        root,
        commit.short_hash(),
        commit.message,
        changed,
        if changed == 1 { "" } else { "s" }
    )))
}

fn branch(parsed: &ParsedCommand, repo: &mut RepositoryState) -> Result<CommandResult, Error> {
    if let Some(flag) = parsed.any_flag(&["d", "D", "delete"]) {
        let name = match flag {
            FlagValue::Value(name) => name.clone(),
            FlagValue::Switch => parsed
                .args
                .first()
                .cloned()
                .ok_or(Error::BranchNameRequired)?,
        };
        let tip = repo.delete_branch(&name)?;
        let text = match tip {
            Some(hash) => format!("Deleted branch {} (was {}).", name, &hash[..hash.len().min(7)]),
            None => format!("Deleted branch {}.", name),
        };
        return Ok(CommandResult::success(text));
    }

    match parsed.args.first() {
        Some(name) => {
            repo.create_branch(name)?;
            Ok(CommandResult::success(""))
        }
        None => {
            let verbose = parsed.any_flag(&["v", "verbose"]).is_some();
            Ok(CommandResult::output(render_branches(repo, verbose)))
        }
    }
}

fn render_branches(repo: &RepositoryState, verbose: bool) -> String {
    let width = repo.branches().iter().map(String::len).max().unwrap_or(0);

    repo.branches()
        .iter()
        .map(|name| {
            let marker = if name == repo.current_branch() { "* " } else { "  " };
            let tip = repo.branch_tip(name).and_then(|hash| repo.find_commit(hash));
            match (verbose, tip) {
                (true, Some(commit)) => format!(
                    "{}{:width$} {} {}",
                    marker,
                    name,
                    commit.short_hash(),
                    commit.message,
                    width = width
                ),
                _ => format!("{}{}", marker, name),
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SwitchStyle {
    Checkout,
    Switch,
}

impl SwitchStyle {
    fn create_flags(self) -> &'static [&'static str] {
        match self {
            SwitchStyle::Checkout => &["b"],
            SwitchStyle::Switch => &["c", "create"],
        }
    }

    fn missing(self, name: &str) -> Error {
        match self {
            SwitchStyle::Checkout => Error::PathspecUnknownToGit(name.to_string()),
            SwitchStyle::Switch => Error::InvalidReference(name.to_string()),
        }
    }
}

fn checkout(
    parsed: &ParsedCommand,
    repo: &mut RepositoryState,
    style: SwitchStyle,
) -> Result<CommandResult, Error> {
    if let Some(flag) = parsed.any_flag(style.create_flags()) {
        let name = match flag {
            FlagValue::Value(name) => name,
            FlagValue::Switch => {
                let switch = style.create_flags()[0];
                return Err(Error::SwitchRequiresValue(switch.to_string()));
            }
        };
        repo.create_branch(name)?;
        repo.switch_branch(name)?;
        return Ok(CommandResult::success(format!(
            "Switched to a new branch '{}'",
            name
        )));
    }

    let name = parsed.args.first().ok_or(Error::MissingBranchArgument)?;
    if !repo.has_branch(name) {
        return Err(style.missing(name));
    }

    if repo.switch_branch(name)? {
        Ok(CommandResult::success(format!(
            "Switched to branch '{}'",
            name
        )))
    } else {
        Ok(CommandResult::output(format!("Already on '{}'", name)))
    }
}

fn log(parsed: &ParsedCommand, repo: &RepositoryState) -> Result<CommandResult, Error> {
    if repo.commits().is_empty() {
        return Err(Error::NoCommitsYet(repo.current_branch().to_string()));
    }

    let limit = match parsed.any_flag(&["n", "max-count"]) {
        Some(FlagValue::Value(count)) => count
            .parse::<usize>()
            .map_err(|_| Error::InvalidCount(count.clone()))?,
        Some(FlagValue::Switch) => return Err(Error::SwitchRequiresValue("n".to_string())),
        None => usize::MAX,
    };
    let oneline = parsed.has_flag("oneline");

    let commits = repo.commits().iter().rev().take(limit);
    let text = if oneline {
        commits
            .map(|c| format!("{} {}", c.short_hash(), c.message))
            .collect::<Vec<_>>()
            .join("\n")
    } else {
        commits.map(render_log_entry).collect::<Vec<_>>().join("\n")
    };

    Ok(CommandResult::output(text))
}

fn render_log_entry(commit: &Commit) -> String {
    let mut entry = format!("commit {}\n", commit.hash);
    if commit.is_merge() {
        let parents: Vec<&str> = commit
            .parents
            .iter()
            .map(|p| &p[..p.len().min(7)])
            .collect();
        let _ = writeln!(entry, "Merge: {}", parents.join(" "));
    }
    let _ = writeln!(entry, "Author: {}", commit.author);
    let _ = writeln!(
        entry,
        "Date:   {}",
        commit.timestamp.format("%a %b %-d %H:%M:%S %Y %z")
    );
    let _ = writeln!(entry);
    let _ = writeln!(entry, "    {}", commit.message);
    entry
}

fn merge(
    parsed: &ParsedCommand,
    repo: &mut RepositoryState,
    config: &SimulatorConfig,
) -> Result<CommandResult, Error> {
    let branch = parsed.args.first().ok_or(Error::BranchNameRequired)?;
    let commit = repo.merge(branch, &config.author)?;
    tracing::debug!(merge = %commit.hash, parents = ?commit.parents, "merge commit created");
    Ok(CommandResult::success(
        "Merge made by the 'ort' strategy.",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        executor::{Executor, OutputKind},
        repository::RepositoryState,
    };

    fn session(lines: &[&str]) -> Executor {
        let mut executor = Executor::default();
        for line in lines {
            executor.execute_now(line);
        }
        executor
    }

    #[test]
    fn test_every_subcommand_round_trips_its_name() {
        for subcommand in Subcommand::ALL {
            assert_eq!(Subcommand::from_name(subcommand.name()), Some(subcommand));
        }
        assert_eq!(Subcommand::from_name("--version"), Some(Subcommand::Version));
        assert_eq!(Subcommand::from_name("rebase"), None);
    }

    #[test]
    fn test_bare_git_prints_usage() {
        let mut executor = Executor::default();
        let result = executor.execute_now("git");
        assert_eq!(result.kind, OutputKind::Output);
        assert!(result.output.starts_with("usage: git"));
    }

    #[test]
    fn test_unknown_subcommand_suggests() {
        let mut executor = Executor::default();
        let result = executor.execute_now("git comit -m x");
        assert!(result.is_error());
        assert!(result.output.contains("'comit' is not a git command"));
        assert!(result.output.contains("\tcommit"));
    }

    #[test]
    fn test_everything_but_init_requires_repository() {
        for line in [
            "git status",
            "git add a.txt",
            "git commit -m x",
            "git branch",
            "git checkout main",
            "git switch main",
            "git log",
            "git merge main",
        ] {
            let mut executor = Executor::default();
            let result = executor.execute_now(line);
            assert!(result.is_error(), "{line} should fail");
            assert!(
                result.output.contains("not a git repository"),
                "{line}: {}",
                result.output
            );
        }
    }

    #[test]
    fn test_reinit_is_informational() {
        let mut executor = session(&["git init", "touch a", "git add a", "git commit -m one"]);
        let result = executor.execute_now("git init");
        assert_eq!(result.kind, OutputKind::Output);
        assert!(result.output.contains("Reinitialized"));
        assert_eq!(executor.state().commits().len(), 1);
    }

    #[test]
    fn test_status_sections() {
        let mut executor = session(&[
            "git init",
            "touch a.txt",
            "git add a.txt",
            "git commit -m first",
            "echo more > a.txt",
            "touch b.txt",
            "touch c.txt",
            "git add c.txt",
        ]);
        let status = executor.execute_now("git status").output;
        assert!(status.starts_with("On branch main"));
        assert!(!status.contains("No commits yet"));
        assert!(status.contains("Changes to be committed:"));
        assert!(status.contains("new file:   c.txt"));
        assert!(status.contains("Changes not staged for commit:"));
        assert!(status.contains("modified:   a.txt"));
        assert!(status.contains("Untracked files:"));
        assert!(status.contains("\tb.txt"));
    }

    #[test]
    fn test_status_clean_tree() {
        let mut executor = session(&["git init"]);
        let status = executor.execute_now("git status").output;
        assert!(status.contains("No commits yet"));
        assert!(status.ends_with("nothing to commit, working tree clean"));
    }

    #[test]
    fn test_add_requires_arguments() {
        let mut executor = session(&["git init"]);
        let result = executor.execute_now("git add");
        assert!(result.is_error());
        assert!(result.output.starts_with("Nothing specified"));
    }

    #[test]
    fn test_add_unknown_file() {
        let mut executor = session(&["git init"]);
        let result = executor.execute_now("git add ghost.txt");
        assert!(result.is_error());
        assert!(result.output.contains("pathspec 'ghost.txt'"));
    }

    #[test]
    fn test_add_dot_and_all_flag_stage_everything() {
        let executor = session(&["git init", "touch a b", "git add ."]);
        assert_eq!(executor.state().staging_area().len(), 2);

        let executor = session(&["git init", "touch a b", "git add -A"]);
        assert_eq!(executor.state().staging_area().len(), 2);
        assert!(executor.state().working_directory().is_empty());
    }

    #[test]
    fn test_add_multiple_files() {
        let executor = session(&["git init", "touch a b c", "git add a c"]);
        assert_eq!(executor.state().staging_area(), ["a".to_string(), "c".to_string()]);
        assert_eq!(executor.state().working_directory(), ["b".to_string()]);
    }

    #[test]
    fn test_commit_output_and_message_flag_forms() {
        let mut executor = session(&["git init", "touch a b", "git add ."]);
        let result = executor.execute_now("git commit --message=\"first one\"");
        assert_eq!(result.kind, OutputKind::Success);
        assert!(result.output.starts_with("[main (root-commit) "));
        assert!(result.output.contains("] first one\n 2 files changed"));
    }

    #[test]
    fn test_commit_requires_message_value() {
        let mut executor = session(&["git init", "touch a", "git add a"]);
        for line in ["git commit", "git commit -m"] {
            let result = executor.execute_now(line);
            assert!(result.is_error());
            assert!(result.output.contains("switch `m' requires a value"));
        }
        assert!(executor.state().commits().is_empty());
    }

    #[test]
    fn test_branch_listing_marks_current() {
        let mut executor = session(&["git init", "git branch feature", "git checkout feature"]);
        let result = executor.execute_now("git branch");
        assert_eq!(result.kind, OutputKind::Output);
        assert_eq!(result.output, "  main\n* feature");
    }

    #[test]
    fn test_branch_verbose_shows_tips() {
        let mut executor = session(&[
            "git init",
            "touch a",
            "git add a",
            "git commit -m base",
            "git branch topic",
        ]);
        let listing = executor.execute_now("git branch -v").output;
        let head = executor.state().commits()[0].short_hash().to_string();
        assert!(listing.contains(&format!("* main  {} base", head)));
        assert!(listing.contains(&format!("  topic {} base", head)));
    }

    #[test]
    fn test_branch_duplicate_fails() {
        let mut executor = session(&["git init", "git branch feature"]);
        let result = executor.execute_now("git branch feature");
        assert!(result.is_error());
        assert!(result.output.contains("already exists"));
        assert_eq!(executor.state().branches().len(), 2);
    }

    #[test]
    fn test_branch_delete() {
        let mut executor = session(&["git init", "git branch old"]);
        let result = executor.execute_now("git branch -d old");
        assert_eq!(result.output, "Deleted branch old.");
        assert!(!executor.state().has_branch("old"));

        let result = executor.execute_now("git branch -d main");
        assert!(result.is_error());
        let result = executor.execute_now("git branch -D");
        assert!(result.output.contains("branch name required"));
    }

    #[test]
    fn test_checkout_variants() {
        let mut executor = session(&["git init"]);
        let result = executor.execute_now("git checkout ghost");
        assert!(result.is_error());
        assert!(result.output.contains("pathspec 'ghost'"));

        let result = executor.execute_now("git checkout -b feature");
        assert_eq!(result.output, "Switched to a new branch 'feature'");
        assert_eq!(executor.state().current_branch(), "feature");

        let result = executor.execute_now("git checkout -b feature");
        assert!(result.output.contains("already exists"));

        let result = executor.execute_now("git checkout feature");
        assert_eq!(result.output, "Already on 'feature'");

        let result = executor.execute_now("git checkout -b");
        assert!(result.output.contains("switch `b' requires a value"));

        let result = executor.execute_now("git checkout");
        assert!(result.is_error());
    }

    #[test]
    fn test_switch_variants() {
        let mut executor = session(&["git init"]);
        let result = executor.execute_now("git switch -c topic");
        assert_eq!(result.kind, OutputKind::Success);
        let result = executor.execute_now("git switch main");
        assert_eq!(result.output, "Switched to branch 'main'");
        let result = executor.execute_now("git switch nowhere");
        assert!(result.output.contains("invalid reference: nowhere"));
    }

    #[test]
    fn test_log_without_commits() {
        let mut executor = session(&["git init"]);
        let result = executor.execute_now("git log");
        assert!(result.is_error());
        assert!(result.output.contains("does not have any commits yet"));
    }

    #[test]
    fn test_log_newest_first() {
        let mut executor = session(&[
            "git init",
            "touch a",
            "git add a",
            "git commit -m first",
            "touch b",
            "git add b",
            "git commit -m second",
        ]);
        let log = executor.execute_now("git log").output;
        let second = log.find("    second").unwrap();
        let first = log.find("    first").unwrap();
        assert!(second < first);
        assert!(log.contains("Author: Student"));
        assert!(log.contains("Date:   "));

        let oneline = executor.execute_now("git log --oneline -n 1").output;
        assert_eq!(oneline.lines().count(), 1);
        assert!(oneline.ends_with(" second"));

        let result = executor.execute_now("git log -n lots");
        assert!(result.is_error());
    }

    #[test]
    fn test_log_does_not_reorder_state() {
        let mut executor = session(&[
            "git init",
            "touch a",
            "git add a",
            "git commit -m first",
            "touch b",
            "git add b",
            "git commit -m second",
        ]);
        executor.execute_now("git log");
        executor.execute_now("git log");
        assert_eq!(executor.state().commits()[0].message, "first");
    }

    #[test]
    fn test_merge_flow_and_log_shows_merge_line() {
        let mut executor = session(&[
            "git init",
            "git checkout -b feature",
            "touch a.txt",
            "git add a.txt",
            "git commit -m \"on feature\"",
            "git checkout main",
        ]);
        let result = executor.execute_now("git merge feature");
        assert_eq!(result.kind, OutputKind::Success);
        let last = executor.state().commits().last().unwrap();
        assert_eq!(last.parents.len(), 2);
        assert!(executor.execute_now("git log").output.contains("Merge: "));
    }

    #[test]
    fn test_merge_errors() {
        let mut executor = session(&["git init", "git branch feature"]);
        assert!(executor
            .execute_now("git merge")
            .output
            .contains("branch name required"));
        assert!(executor
            .execute_now("git merge ghost")
            .output
            .contains("does not refer to a commit"));
        assert!(executor
            .execute_now("git merge main")
            .output
            .contains("into itself"));
        assert!(executor
            .execute_now("git merge feature")
            .output
            .contains("nothing to merge"));
        assert!(executor.state().commits().is_empty());
    }

    #[test]
    fn test_status_render_is_pure() {
        let mut repo = RepositoryState::new();
        repo.init("main");
        repo.touch_file("a");
        let before = repo.clone();
        render_status(&repo);
        assert_eq!(repo, before);
    }
}
