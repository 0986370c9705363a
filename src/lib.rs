#![deny(clippy::mod_module_files)]
//! In-memory Git simulation core for a learn-by-typing terminal.
//!
//! A [`Session`] owns one [`RepositoryState`] through its [`Executor`],
//! records every command in a [`CommandRecorder`], and checks the resulting
//! state against declarative [`ValidationTest`]s.

pub mod challenge;
pub mod config;
pub mod conflict;
pub mod error;
pub mod executor;
pub mod parser;
pub mod recorder;
pub mod repository;
pub mod session;
pub mod suggest;
pub mod validation;

pub use challenge::Challenge;
pub use config::SimulatorConfig;
pub use conflict::{ConflictMarker, ConflictResolver, Resolution};
pub use error::Error;
pub use executor::{CommandResult, Executor, OutputKind};
pub use parser::{parse, FlagValue, ParseError, ParsedCommand, WhitespacePolicy};
pub use recorder::{CommandRecord, CommandRecorder};
pub use repository::{Commit, RepositoryState};
pub use session::Session;
pub use validation::{
    all_tests_passed, failed_tests, CheckValue, GitCheck, ValidationEngine, ValidationResult,
    ValidationTest,
};
