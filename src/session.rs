use std::path::Path;

use anyhow::{Context, Result};

use crate::{
    challenge::{Challenge, Hint},
    config::SimulatorConfig,
    executor::{CommandResult, Executor, Subcommand},
    recorder::{CommandRecord, CommandRecorder},
    repository::RepositoryState,
    suggest,
    validation::{self, ValidationEngine, ValidationResult, ValidationTest},
};

/// One learner at one terminal: the executor that owns the repository, the
/// history of what was typed, and optionally the challenge being attempted.
#[derive(Debug, Clone)]
pub struct Session {
    executor: Executor,
    recorder: CommandRecorder,
    challenge: Option<Challenge>,
    hints_shown: usize,
}

impl Session {
    /// A playground session with no challenge attached.
    pub fn new(config: SimulatorConfig) -> Self {
        Session {
            executor: Executor::new(config),
            recorder: CommandRecorder::new(),
            challenge: None,
            hints_shown: 0,
        }
    }

    /// A session whose working directory starts with the challenge's files.
    pub fn with_challenge(challenge: Challenge, config: SimulatorConfig) -> Self {
        let state = starting_state(&challenge);
        tracing::info!(id = %challenge.id, "starting challenge session");
        Session {
            executor: Executor::with_state(state, config),
            recorder: CommandRecorder::new(),
            challenge: Some(challenge),
            hints_shown: 0,
        }
    }

    /// Run one line of input and record it. Blank lines are not recorded.
    pub async fn execute(&mut self, input: &str) -> CommandResult {
        let command = input.trim();
        if command.is_empty() {
            return CommandResult::output("");
        }

        let before = self.executor.state().clone();
        let result = self.executor.execute(command).await;
        self.recorder.record(
            command,
            &before,
            self.executor.state(),
            &result.output,
            !result.is_error(),
        );
        result
    }

    pub fn state(&self) -> &RepositoryState {
        self.executor.state()
    }

    pub fn config(&self) -> &SimulatorConfig {
        self.executor.config()
    }

    pub fn recorder(&self) -> &CommandRecorder {
        &self.recorder
    }

    pub fn challenge(&self) -> Option<&Challenge> {
        self.challenge.as_ref()
    }

    pub fn validate(&self, tests: &[ValidationTest]) -> Vec<ValidationResult> {
        ValidationEngine::new(self.state()).validate(tests)
    }

    /// Validate against the attached challenge, if any.
    pub fn check_challenge(&self) -> Option<Vec<ValidationResult>> {
        self.challenge
            .as_ref()
            .map(|c| self.validate(&c.validation_tests))
    }

    pub fn is_complete(&self) -> bool {
        self.check_challenge()
            .is_some_and(|results| validation::all_tests_passed(&results))
    }

    /// Reveal the next hint, vaguest first. `None` once all are shown.
    pub fn next_hint(&mut self) -> Option<&Hint> {
        let hint = self
            .challenge
            .as_ref()?
            .hints_in_order()
            .get(self.hints_shown)
            .copied()?;
        self.hints_shown += 1;
        Some(hint)
    }

    pub fn hints_shown(&self) -> usize {
        self.hints_shown
    }

    /// Advice after `command` failed during a challenge: working forms of
    /// the subcommand it resembles, else the first few expected commands.
    pub fn hint_for_failure(&self, command: &str) -> Option<String> {
        let challenge = self.challenge.as_ref()?;

        let mut words = command.split_whitespace();
        let subcommand = match (words.next(), words.next()) {
            (Some(git), Some(sub)) if git.eq_ignore_ascii_case("git") => {
                let names: Vec<&str> = Subcommand::ALL.iter().map(|s| s.name()).collect();
                suggest::closest(sub, &names)
            }
            _ => None,
        };
        if let Some(examples) = subcommand.and_then(suggest::usage_examples) {
            return Some(format!("Try one of these: {}", examples.join(", ")));
        }

        if challenge.expected_commands.is_empty() {
            return Some("Check the challenge instructions for the correct commands".to_string());
        }
        let expected: Vec<&str> = challenge
            .expected_commands
            .iter()
            .take(3)
            .map(String::as_str)
            .collect();
        Some(format!("Expected commands include: {}", expected.join(", ")))
    }

    pub fn back(&mut self) -> Option<&CommandRecord> {
        self.recorder.go_back()
    }

    pub fn forward(&mut self) -> Option<&CommandRecord> {
        self.recorder.go_forward()
    }

    pub fn export_script(&self) -> String {
        self.recorder.export_script()
    }

    /// Write the successful-command script to `path`, creating parent
    /// directories as needed.
    pub fn write_script(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create export directory: {:?}", parent))?;
        }

        let mut script = self.export_script();
        script.push('\n');
        std::fs::write(path, script)
            .with_context(|| format!("Failed to write session script: {:?}", path))?;

        tracing::info!(
            "exported {} command(s) to {:?}",
            self.recorder.successful_commands().count(),
            path
        );
        Ok(())
    }

    /// Throw away the repository and history. A challenge session gets its
    /// starting files back.
    pub fn reset(&mut self) {
        let state = self
            .challenge
            .as_ref()
            .map(starting_state)
            .unwrap_or_default();
        let config = self.executor.config().clone();
        self.executor = Executor::with_state(state, config);
        self.recorder.reset();
        self.hints_shown = 0;
        tracing::info!("session reset");
    }
}

fn starting_state(challenge: &Challenge) -> RepositoryState {
    let mut state = RepositoryState::new();
    for file in challenge.starting_file_names() {
        state.touch_file(&file);
    }
    state
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::{executor::OutputKind, validation::GitCheck};

    fn challenge() -> Challenge {
        Challenge::from_yaml_str(
            r#"
id: branching
title: Make a branch
expectedCommands: ["git init", "git branch feature", "git checkout feature", "git branch"]
startingFiles:
  - { name: app.js, type: file }
validationTests:
  - id: t1
    description: Repository exists
    gitCheck: { type: status, value: initialized }
  - id: t2
    description: Branch feature exists
    gitCheck: { type: branch, value: feature }
hints:
  - { id: h2, level: 2, text: "git branch feature" }
  - { id: h1, level: 1, text: "Start with git init" }
"#,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_execute_records_history() {
        let mut session = Session::new(SimulatorConfig::default());
        session.execute("git init").await;
        session.execute("git comit").await;
        session.execute("   ").await;

        let history = session.recorder().history();
        assert_eq!(history.len(), 2);
        assert!(history[0].success);
        assert!(!history[0].state_before.is_initialized());
        assert!(history[0].state_after.is_initialized());
        assert!(!history[1].success);
        assert_eq!(session.export_script(), "git init");
    }

    #[tokio::test]
    async fn test_challenge_seeds_files_and_completes() {
        let mut session = Session::with_challenge(challenge(), SimulatorConfig::default());
        assert_eq!(session.state().working_directory(), ["app.js".to_string()]);
        assert!(!session.is_complete());

        session.execute("git init").await;
        let results = session.check_challenge().unwrap();
        assert!(results[0].passed);
        assert!(!results[1].passed);

        let result = session.execute("git branch feature").await;
        assert_eq!(result.kind, OutputKind::Success);
        assert!(session.is_complete());
    }

    #[test]
    fn test_hint_for_failure() {
        let playground = Session::new(SimulatorConfig::default());
        assert_eq!(playground.hint_for_failure("git comit"), None);

        let session = Session::with_challenge(challenge(), SimulatorConfig::default());
        assert_eq!(
            session.hint_for_failure("git mege feature").as_deref(),
            Some("Try one of these: git merge <branch>")
        );
        assert_eq!(
            session.hint_for_failure("git status").as_deref(),
            Some("Expected commands include: git init, git branch feature, git checkout feature")
        );
        assert_eq!(
            session.hint_for_failure("cat nothing").as_deref(),
            Some("Expected commands include: git init, git branch feature, git checkout feature")
        );
    }

    #[test]
    fn test_hints_progress_then_run_out() {
        let mut session = Session::with_challenge(challenge(), SimulatorConfig::default());
        assert_eq!(session.next_hint().map(|h| h.id.clone()), Some("h1".to_string()));
        assert_eq!(session.next_hint().map(|h| h.id.clone()), Some("h2".to_string()));
        assert!(session.next_hint().is_none());
        assert_eq!(session.hints_shown(), 2);

        let mut playground = Session::new(SimulatorConfig::default());
        assert!(playground.next_hint().is_none());
        assert!(playground.check_challenge().is_none());
        assert!(!playground.is_complete());
    }

    #[tokio::test]
    async fn test_playback_does_not_touch_live_state() {
        let mut session = Session::new(SimulatorConfig::default());
        session.execute("git init").await;
        session.execute("touch a.txt").await;

        let record = session.back().cloned().unwrap();
        assert_eq!(record.command, "git init");
        assert_eq!(session.state().working_directory(), ["a.txt".to_string()]);
        assert!(session.forward().is_some());
    }

    #[tokio::test]
    async fn test_reset_restores_starting_files() {
        let mut session = Session::with_challenge(challenge(), SimulatorConfig::default());
        session.execute("git init").await;
        session.execute("git add app.js").await;
        session.next_hint();

        session.reset();
        assert!(!session.state().is_initialized());
        assert_eq!(session.state().working_directory(), ["app.js".to_string()]);
        assert!(session.recorder().is_empty());
        assert_eq!(session.hints_shown(), 0);
    }

    #[tokio::test]
    async fn test_validate_arbitrary_tests() {
        let mut session = Session::new(SimulatorConfig::default());
        session.execute("git init").await;
        let tests = [ValidationTest::new("t", "any branch", GitCheck::bare("branch"))];
        assert!(!session.validate(&tests)[0].passed);
    }

    #[tokio::test]
    async fn test_write_script() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out/session.sh");
        let mut session = Session::new(SimulatorConfig::default());
        session.execute("git init").await;
        session.execute("touch a").await;
        session.write_script(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "git init\ntouch a\n");
    }
}
