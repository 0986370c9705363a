//! Scrubbable history of a session's commands.
//!
//! The recorder only stores snapshots handed to it. Stepping through history
//! never re-executes anything and never changes the live repository.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::repository::RepositoryState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandRecord {
    pub id: String,
    pub command: String,
    pub timestamp: DateTime<Utc>,
    pub state_before: RepositoryState,
    pub state_after: RepositoryState,
    pub output: String,
    pub success: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CommandRecorder {
    history: Vec<CommandRecord>,
    /// Index of the entry being viewed; `None` while the log is empty
    cursor: Option<usize>,
    next_id: u64,
}

impl CommandRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record. Entries after the cursor are dropped first, so
    /// recording after stepping back discards the old future.
    pub fn record(
        &mut self,
        command: &str,
        state_before: &RepositoryState,
        state_after: &RepositoryState,
        output: &str,
        success: bool,
    ) -> &CommandRecord {
        if let Some(cursor) = self.cursor {
            if cursor + 1 < self.history.len() {
                tracing::debug!(
                    "discarding {} entries ahead of the cursor",
                    self.history.len() - cursor - 1
                );
                self.history.truncate(cursor + 1);
            }
        }

        self.next_id += 1;
        self.history.push(CommandRecord {
            id: format!("cmd-{}", self.next_id),
            command: command.to_string(),
            timestamp: Utc::now(),
            state_before: state_before.clone(),
            state_after: state_after.clone(),
            output: output.to_string(),
            success,
        });
        let last = self.history.len() - 1;
        self.cursor = Some(last);
        &self.history[last]
    }

    pub fn history(&self) -> &[CommandRecord] {
        &self.history
    }

    pub fn current(&self) -> Option<&CommandRecord> {
        self.cursor.and_then(|i| self.history.get(i))
    }

    pub fn can_go_back(&self) -> bool {
        matches!(self.cursor, Some(i) if i > 0)
    }

    pub fn can_go_forward(&self) -> bool {
        matches!(self.cursor, Some(i) if i + 1 < self.history.len())
    }

    pub fn go_back(&mut self) -> Option<&CommandRecord> {
        let cursor = self.cursor.filter(|&i| i > 0)? - 1;
        self.cursor = Some(cursor);
        self.history.get(cursor)
    }

    pub fn go_forward(&mut self) -> Option<&CommandRecord> {
        let cursor = self.cursor.filter(|&i| i + 1 < self.history.len())? + 1;
        self.cursor = Some(cursor);
        self.history.get(cursor)
    }

    pub fn successful_commands(&self) -> impl Iterator<Item = &str> {
        self.history
            .iter()
            .filter(|r| r.success)
            .map(|r| r.command.as_str())
    }

    /// Successful commands, one per line, ready to save as a shell script.
    pub fn export_script(&self) -> String {
        self.successful_commands().collect::<Vec<_>>().join("\n")
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Percentage of recorded commands that succeeded, 0 for an empty log.
    pub fn success_rate(&self) -> f64 {
        if self.history.is_empty() {
            return 0.0;
        }
        let ok = self.history.iter().filter(|r| r.success).count();
        ok as f64 * 100.0 / self.history.len() as f64
    }

    pub fn reset(&mut self) {
        self.history.clear();
        self.cursor = None;
    }
}
