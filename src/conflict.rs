//! Conflict markers in file text and the ways a learner can settle them.
//!
//! This works on text only. Producing conflicts is not something the
//! simulated merge does; challenge content supplies the conflicted files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

const CURRENT_MARKER: &str = "<<<<<<<";
const SEPARATOR: &str = "=======";
const INCOMING_MARKER: &str = ">>>>>>>";

/// One `<<<<<<< ... ======= ... >>>>>>>` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictMarker {
    pub file: String,
    /// 0-based line of the `<<<<<<<` marker
    pub start_line: usize,
    /// 0-based line of the `>>>>>>>` marker
    pub end_line: usize,
    pub current_content: String,
    pub incoming_content: String,
}

/// How to settle every conflict block in a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Resolution {
    AcceptCurrent,
    AcceptIncoming,
    AcceptBoth,
    /// Replace the whole file with text the learner wrote.
    Custom(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Outside,
    Current,
    Incoming,
}

/// Find the complete conflict blocks in `content`. A block missing its
/// closing marker is not reported.
pub fn parse_markers(file: &str, content: &str) -> Vec<ConflictMarker> {
    let mut markers = Vec::new();
    let mut section = Section::Outside;
    let mut start = 0;
    let mut current: Vec<&str> = Vec::new();
    let mut incoming: Vec<&str> = Vec::new();

    for (index, line) in content.split('\n').enumerate() {
        if line.starts_with(CURRENT_MARKER) {
            section = Section::Current;
            start = index;
            current.clear();
            incoming.clear();
        } else if section == Section::Outside {
            continue;
        } else if line.starts_with(SEPARATOR) {
            section = Section::Incoming;
        } else if line.starts_with(INCOMING_MARKER) {
            markers.push(ConflictMarker {
                file: file.to_string(),
                start_line: start,
                end_line: index,
                current_content: current.join("\n"),
                incoming_content: incoming.join("\n"),
            });
            section = Section::Outside;
        } else if section == Section::Current {
            current.push(line);
        } else {
            incoming.push(line);
        }
    }

    markers
}

/// Rewrite `content` with each conflict block replaced by the side chosen
/// in `resolution`. Lines outside blocks are kept. An unterminated block is
/// left as written.
pub fn resolve(content: &str, resolution: &Resolution) -> String {
    if let Resolution::Custom(text) = resolution {
        return text.clone();
    }

    let mut out: Vec<&str> = Vec::new();
    let mut block: Vec<&str> = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut incoming: Vec<&str> = Vec::new();
    let mut section = Section::Outside;

    for line in content.split('\n') {
        if line.starts_with(CURRENT_MARKER) {
            out.append(&mut block);
            current.clear();
            incoming.clear();
            block.push(line);
            section = Section::Current;
            continue;
        }
        match section {
            Section::Outside => out.push(line),
            _ if line.starts_with(SEPARATOR) => {
                block.push(line);
                section = Section::Incoming;
            }
            _ if line.starts_with(INCOMING_MARKER) => {
                match resolution {
                    Resolution::AcceptCurrent => out.append(&mut current),
                    Resolution::AcceptIncoming => out.append(&mut incoming),
                    Resolution::AcceptBoth => {
                        out.append(&mut current);
                        out.append(&mut incoming);
                    }
                    Resolution::Custom(_) => {}
                }
                block.clear();
                section = Section::Outside;
            }
            Section::Current => {
                block.push(line);
                current.push(line);
            }
            Section::Incoming => {
                block.push(line);
                incoming.push(line);
            }
        }
    }
    out.append(&mut block);

    out.join("\n")
}

/// Conflicts found across a set of files, keyed by filename.
#[derive(Debug, Clone, Default)]
pub struct ConflictResolver {
    conflicts: BTreeMap<String, Vec<ConflictMarker>>,
}

impl ConflictResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan `files` (name -> content) and remember which ones are
    /// conflicted. Returns every block found.
    pub fn detect_conflicts<'a, I>(&mut self, files: I) -> Vec<ConflictMarker>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut found = Vec::new();
        for (name, content) in files {
            let markers = parse_markers(name, content);
            if markers.is_empty() {
                continue;
            }
            tracing::debug!(file = name, blocks = markers.len(), "conflicts detected");
            found.extend(markers.iter().cloned());
            self.conflicts.insert(name.to_string(), markers);
        }
        found
    }

    /// Settle `file` and forget its conflicts. A file with no recorded
    /// conflicts comes back unchanged, or as the custom text.
    pub fn resolve(&mut self, file: &str, content: &str, resolution: &Resolution) -> String {
        if self.conflicts.remove(file).is_none() {
            return match resolution {
                Resolution::Custom(text) => text.clone(),
                _ => content.to_string(),
            };
        }
        resolve(content, resolution)
    }

    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }

    pub fn conflicted_files(&self) -> impl Iterator<Item = &str> {
        self.conflicts.keys().map(String::as_str)
    }

    /// Blocks still unresolved across all files.
    pub fn conflict_count(&self) -> usize {
        self.conflicts.values().map(Vec::len).sum()
    }

    pub fn clear(&mut self) {
        self.conflicts.clear();
    }
}
