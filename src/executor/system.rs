use super::{git::Subcommand, CommandResult};
use crate::{
    config::SimulatorConfig, error::Error, parser::ParsedCommand, repository::RepositoryState,
    suggest,
};

/// ANSI erase-display plus cursor-home, returned by `clear`.
pub const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

const HELP: &str = "Available commands:
  help           Show this help message
  clear          Clear the terminal
  pwd            Print working directory
  ls             List files
  touch <file>   Create a file
  cat <file>     Display file contents
  echo <text>    Print text (echo <text> > <file> writes a file)

Git commands:
  git init       Initialize a repository
  git status     Show repository status
  git add        Stage files
  git commit     Commit changes
  git branch     Manage branches
  git checkout   Switch branches
  git switch     Switch branches
  git log        View commit history
  git merge      Merge branches";

/// Shell built-ins available next to `git`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemCommand {
    Touch,
    Echo,
    Cat,
    Ls,
    Pwd,
    Clear,
    Help,
}

impl SystemCommand {
    pub const ALL: [SystemCommand; 7] = [
        SystemCommand::Touch,
        SystemCommand::Echo,
        SystemCommand::Cat,
        SystemCommand::Ls,
        SystemCommand::Pwd,
        SystemCommand::Clear,
        SystemCommand::Help,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SystemCommand::Touch => "touch",
            SystemCommand::Echo => "echo",
            SystemCommand::Cat => "cat",
            SystemCommand::Ls => "ls",
            SystemCommand::Pwd => "pwd",
            SystemCommand::Clear => "clear",
            SystemCommand::Help => "help",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }
}

pub(super) fn run(
    parsed: &ParsedCommand,
    repo: &mut RepositoryState,
    config: &SimulatorConfig,
) -> Result<CommandResult, Error> {
    let command = SystemCommand::from_name(&parsed.command).ok_or_else(|| {
        Error::UnknownCommand {
            name: parsed.command.clone(),
            suggestion: suggest_command(&parsed.command),
        }
    })?;

    match command {
        SystemCommand::Touch => touch(&parsed.args, repo),
        SystemCommand::Echo => echo(&parsed.args, repo),
        SystemCommand::Cat => cat(&parsed.args, repo),
        SystemCommand::Ls => Ok(CommandResult::output(repo.known_files().join("  "))),
        SystemCommand::Pwd => Ok(CommandResult::output(config.workspace_label.clone())),
        SystemCommand::Clear => Ok(CommandResult::output(CLEAR_SCREEN)),
        SystemCommand::Help => Ok(CommandResult::output(HELP)),
    }
}

/// A bare git subcommand ("commit") most likely lacks its `git` prefix.
fn suggest_command(name: &str) -> Option<String> {
    if let Some(subcommand) = Subcommand::from_name(name) {
        return Some(format!("git {}", subcommand.name()));
    }
    let mut candidates: Vec<&str> = SystemCommand::ALL.iter().map(|c| c.name()).collect();
    candidates.push("git");
    suggest::closest(name, &candidates).map(str::to_string)
}

fn touch(args: &[String], repo: &mut RepositoryState) -> Result<CommandResult, Error> {
    if args.is_empty() {
        return Err(Error::MissingOperand("touch"));
    }
    for file in args {
        if !repo.touch_file(file) {
            tracing::debug!("touch: {} already exists", file);
        }
    }
    Ok(CommandResult::success(""))
}

fn echo(args: &[String], repo: &mut RepositoryState) -> Result<CommandResult, Error> {
    let redirect = args.iter().position(|a| a == ">" || a == ">>");
    let Some(index) = redirect else {
        return Ok(CommandResult::output(args.join(" ")));
    };

    let file = args.get(index + 1).ok_or(Error::MissingOperand("echo"))?;
    repo.write_file(file);
    Ok(CommandResult::success(""))
}

fn cat(args: &[String], repo: &RepositoryState) -> Result<CommandResult, Error> {
    let file = args.first().ok_or(Error::MissingOperand("cat"))?;
    if !repo.is_known_file(file) {
        return Err(Error::NoSuchFile {
            command: "cat",
            file: file.clone(),
        });
    }
    Ok(CommandResult::output(format!("[Contents of {}]", file)))
}
