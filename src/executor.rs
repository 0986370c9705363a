//! Maps parsed commands onto repository state transitions.
//!
//! Every command runs against a copy of the state which replaces the live
//! state only when the command succeeds, so a rejected command never leaves a
//! partial change behind.

mod git;
mod system;

use std::panic::{self, AssertUnwindSafe};

use serde::{Deserialize, Serialize};

use crate::{
    config::SimulatorConfig,
    error::Error,
    parser::{self, ParseError, ParsedCommand},
    repository::RepositoryState,
};

pub use git::Subcommand;
pub use system::{SystemCommand, CLEAR_SCREEN};

/// Classification the terminal uses to pick a colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    Output,
    Error,
    Success,
}

/// What a terminal renders after each command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResult {
    pub output: String,
    #[serde(rename = "type")]
    pub kind: OutputKind,
}

impl CommandResult {
    pub fn output(text: impl Into<String>) -> Self {
        CommandResult {
            output: text.into(),
            kind: OutputKind::Output,
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        CommandResult {
            output: text.into(),
            kind: OutputKind::Success,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        CommandResult {
            output: text.into(),
            kind: OutputKind::Error,
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == OutputKind::Error
    }
}

impl From<Error> for CommandResult {
    fn from(e: Error) -> Self {
        CommandResult::error(e.to_string())
    }
}

/// Runs commands for one session against the repository it owns.
#[derive(Debug, Clone, Default)]
pub struct Executor {
    state: RepositoryState,
    config: SimulatorConfig,
}

impl Executor {
    pub fn new(config: SimulatorConfig) -> Self {
        Self::with_state(RepositoryState::new(), config)
    }

    pub fn with_state(state: RepositoryState, config: SimulatorConfig) -> Self {
        Executor { state, config }
    }

    pub fn state(&self) -> &RepositoryState {
        &self.state
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Discard the repository and start over with an empty one.
    pub fn reset(&mut self) {
        self.state = RepositoryState::new();
    }

    /// Execute one line of terminal input.
    ///
    /// Asynchronous so hosts can await it alongside UI work; it performs no
    /// I/O and completes without yielding.
    pub async fn execute(&mut self, input: &str) -> CommandResult {
        self.execute_now(input)
    }

    /// Synchronous form of [`Executor::execute`].
    pub fn execute_now(&mut self, input: &str) -> CommandResult {
        let parsed = match parser::parse(input, self.config.whitespace_policy()) {
            Ok(parsed) => parsed,
            Err(ParseError::Empty) => return CommandResult::output(""),
            Err(e) => return Error::Parse(e).into(),
        };
        tracing::debug!(
            command = %parsed.command,
            subcommand = ?parsed.subcommand,
            args = ?parsed.args,
            "executing command"
        );

        let mut next = self.state.clone();
        let config = &self.config;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| dispatch(&parsed, &mut next, config)));

        match outcome {
            Ok(Ok(result)) => {
                self.state = next;
                result
            }
            Ok(Err(e)) => {
                tracing::debug!("command rejected: {}", e);
                e.into()
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::warn!("command {:?} panicked: {}", input, message);
                Error::Internal(message).into()
            }
        }
    }
}

fn dispatch(
    parsed: &ParsedCommand,
    state: &mut RepositoryState,
    config: &SimulatorConfig,
) -> Result<CommandResult, Error> {
    if parsed.is_git() {
        git::run(parsed, state, config)
    } else {
        system::run(parsed, state, config)
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
