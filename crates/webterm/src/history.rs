//! Command history and suggestions
//!
//! History is kept newest-first and capped; the whole list is rewritten to the
//! [`SessionStore`](crate::SessionStore) whenever it changes.

use chrono::{Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::alias::AliasTable;
use crate::limits::DEFAULT_MAX_HISTORY;

/// How many entries the `history` built-in prints.
const DISPLAY_LIMIT: usize = 50;

/// Shortest prefix that produces suggestions.
const MIN_SUGGEST_PREFIX: usize = 2;

/// Command names offered by [`suggest`] before alias names.
pub const SUGGEST_VOCABULARY: &[&str] = &[
    "cd", "ls", "pwd", "clear", "history", "alias", "unalias", "cat", "echo", "grep", "find",
    "head", "tail", "wc", "mkdir", "rmdir", "touch", "rm", "cp", "mv", "chmod", "php",
    "composer", "npm", "node", "git", "python", "date", "whoami", "hostname", "uname", "df",
    "du", "free",
];

/// One executed command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Command text as typed (trimmed, before alias expansion)
    pub cmd: String,
    /// Unix timestamp in seconds
    pub time: i64,
    /// Session working directory when the command was received
    pub cwd: String,
}

impl HistoryEntry {
    pub fn new(cmd: impl Into<String>, cwd: impl Into<String>) -> Self {
        Self {
            cmd: cmd.into(),
            time: Utc::now().timestamp(),
            cwd: cwd.into(),
        }
    }
}

/// Bounded newest-first command log.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    entries: VecDeque<HistoryEntry>,
    max_entries: usize,
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}

impl HistoryStore {
    /// Empty history holding at most `max_entries`.
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            max_entries,
        }
    }

    /// History restored from a persisted newest-first list.
    pub fn from_entries(entries: Vec<HistoryEntry>, max_entries: usize) -> Self {
        let mut entries = VecDeque::from(entries);
        entries.truncate(max_entries);
        Self {
            entries,
            max_entries,
        }
    }

    /// Record a command at the front, dropping the oldest beyond the cap.
    pub fn append(&mut self, command: &str, cwd: &str) {
        self.entries.push_front(HistoryEntry::new(command, cwd));
        self.entries.truncate(self.max_entries);
    }

    /// Entries newest first.
    pub fn list(&self) -> Vec<HistoryEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Display lines for the `history` built-in.
    pub fn format(&self) -> Vec<String> {
        let mut lines = vec![
            "┌────────────────────────────────────┐".to_string(),
            "│          COMMAND HISTORY           │".to_string(),
            "└────────────────────────────────────┘".to_string(),
        ];

        for (i, entry) in self.entries.iter().take(DISPLAY_LIMIT).enumerate() {
            lines.push(format!(
                "{:>3}  [{}]  {}",
                i + 1,
                format_clock(entry.time),
                entry.cmd
            ));
        }

        lines.push(String::new());
        lines.push(format!("Total: {} commands", self.entries.len()));
        lines
    }
}

fn format_clock(timestamp: i64) -> String {
    match Local.timestamp_opt(timestamp, 0).single() {
        Some(dt) => dt.format("%H:%M:%S").to_string(),
        None => "??:??:??".to_string(),
    }
}

/// Command names and alias names starting with `prefix`.
///
/// The prefix is trimmed and lower-cased; prefixes shorter than two
/// characters produce nothing. Vocabulary matches come first, then alias
/// names, each in their own order and with their original casing.
pub fn suggest(prefix: &str, aliases: &AliasTable) -> Vec<String> {
    let prefix = prefix.trim().to_lowercase();
    if prefix.chars().count() < MIN_SUGGEST_PREFIX {
        return Vec::new();
    }

    SUGGEST_VOCABULARY
        .iter()
        .copied()
        .chain(aliases.names())
        .filter(|candidate| candidate.to_lowercase().starts_with(&prefix))
        .map(|candidate| candidate.to_string())
        .collect()
}
