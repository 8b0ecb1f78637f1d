//! Session aliases
//!
//! An alias rewrites the first word of a command. Expansion happens once:
//! if the expansion itself starts with another alias name it is NOT expanded
//! again, so alias cycles cannot loop.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Error, Result};

/// Aliases every new session starts with.
pub const DEFAULT_ALIASES: &[(&str, &str)] = &[("ll", "ls -la"), ("la", "ls -a")];

/// Mapping from alias name to expansion, listed in lexical order of name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AliasTable {
    entries: BTreeMap<String, String>,
}

impl Default for AliasTable {
    fn default() -> Self {
        Self {
            entries: DEFAULT_ALIASES
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
        }
    }
}

/// Alias names are restricted to ASCII word characters.
pub fn is_valid_alias_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl AliasTable {
    /// Table with the default aliases
    pub fn new() -> Self {
        Self::default()
    }

    /// Table without any alias
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Exact-match lookup of a command's first token.
    pub fn resolve(&self, first_token: &str) -> Option<&str> {
        self.entries.get(first_token).map(|s| s.as_str())
    }

    /// Define or overwrite an alias.
    pub fn add(&mut self, name: &str, value: &str) -> Result<()> {
        if !is_valid_alias_name(name) {
            return Err(Error::InvalidAliasName(name.to_string()));
        }
        self.entries.insert(name.to_string(), value.to_string());
        Ok(())
    }

    /// Remove an alias; false if it was not defined.
    pub fn remove(&mut self, name: &str) -> bool {
        self.entries.remove(name).is_some()
    }

    /// `(name, value)` pairs in lexical order.
    pub fn list(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Alias names in lexical order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot of the table as a plain map.
    pub fn to_map(&self) -> BTreeMap<String, String> {
        self.entries.clone()
    }

    /// Rewrite the first token of `command` if it names an alias.
    ///
    /// The command is split at its first space; the remainder is appended
    /// verbatim after a single space.
    pub fn expand(&self, command: &str) -> Option<String> {
        let (first, rest) = match command.split_once(' ') {
            Some((first, rest)) => (first, Some(rest)),
            None => (command, None),
        };

        let expansion = self.resolve(first)?;
        Some(match rest {
            Some(rest) => format!("{} {}", expansion, rest),
            None => expansion.to_string(),
        })
    }

    /// Display lines for the `alias` built-in.
    pub fn format(&self) -> Vec<String> {
        let mut lines = vec![
            "┌────────────────────────────────────┐".to_string(),
            "│              ALIASES               │".to_string(),
            "└────────────────────────────────────┘".to_string(),
        ];
        for (name, value) in self.list() {
            lines.push(format!("  {:<10} = {}", name, value));
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let table = AliasTable::new();
        assert_eq!(table.resolve("ll"), Some("ls -la"));
        assert_eq!(table.resolve("la"), Some("ls -a"));
        assert_eq!(table.resolve("l"), None);
    }

    #[test]
    fn test_add_overwrites() {
        let mut table = AliasTable::empty();
        table.add("gs", "git status").unwrap();
        table.add("gs", "git status -sb").unwrap();
        assert_eq!(table.resolve("gs"), Some("git status -sb"));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_add_rejects_invalid_names() {
        let mut table = AliasTable::empty();
        assert!(matches!(
            table.add("bad-name", "x"),
            Err(Error::InvalidAliasName(_))
        ));
        assert!(table.add("", "x").is_err());
        assert!(table.add("..", "cd ..").is_err());
        assert!(table.add("ok_1", "x").is_ok());
    }

    #[test]
    fn test_remove() {
        let mut table = AliasTable::new();
        assert!(table.remove("ll"));
        assert!(!table.remove("ll"));
        assert_eq!(table.resolve("ll"), None);
    }

    #[test]
    fn test_list_is_lexical() {
        let mut table = AliasTable::empty();
        table.add("zz", "1").unwrap();
        table.add("aa", "2").unwrap();
        table.add("mm", "3").unwrap();
        let names: Vec<&str> = table.names().collect();
        assert_eq!(names, vec!["aa", "mm", "zz"]);
    }

    #[test]
    fn test_expand_first_token_only() {
        let table = AliasTable::new();
        assert_eq!(table.expand("ll -x"), Some("ls -la -x".to_string()));
        assert_eq!(table.expand("ll"), Some("ls -la".to_string()));
        assert_eq!(table.expand("echo ll"), None);
    }

    #[test]
    fn test_expand_keeps_rest_verbatim() {
        let table = AliasTable::new();
        assert_eq!(
            table.expand("la  two  spaces"),
            Some("ls -a  two  spaces".to_string())
        );
    }

    #[test]
    fn test_expand_is_not_recursive() {
        let mut table = AliasTable::empty();
        table.add("a", "b --flag").unwrap();
        table.add("b", "a").unwrap();
        assert_eq!(table.expand("a"), Some("b --flag".to_string()));
        assert_eq!(table.expand("b x"), Some("a x".to_string()));
    }

    #[test]
    fn test_format() {
        let mut table = AliasTable::empty();
        table.add("gs", "git status").unwrap();
        let lines = table.format();
        assert_eq!(lines.len(), 4);
        assert!(lines[1].contains("ALIASES"));
        assert_eq!(lines[3], "  gs         = git status");
    }

    #[test]
    fn test_serde_is_plain_map() {
        let table = AliasTable::new();
        let json = serde_json::to_string(&table).unwrap();
        assert_eq!(json, r#"{"la":"ls -a","ll":"ls -la"}"#);
        let back: AliasTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back, table);
    }
}
