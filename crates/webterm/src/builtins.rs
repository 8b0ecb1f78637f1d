//! Built-in command matching
//!
//! Each matcher recognizes one built-in and turns the input into a typed
//! [`Builtin`]. [`Builtin::parse`] tries them in a fixed priority order: exact
//! commands first, then the pattern commands. Input that no matcher claims is
//! an external command.

use regex::Regex;
use std::sync::LazyLock;

use crate::listing::ListFlags;

/// `alias name=value`, value optionally wrapped in matching quotes.
static ALIAS_DEFINITION: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)] // literal pattern
    Regex::new(r"^alias\s+([A-Za-z0-9_]+)=(.+)$").unwrap()
});

/// `unalias name`
static UNALIAS: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)] // literal pattern
    Regex::new(r"^unalias\s+([A-Za-z0-9_]+)$").unwrap()
});

/// A command handled without spawning a process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Builtin {
    /// `clear` / `cls`: the front end erases its scrollback
    Clear,
    Pwd,
    History,
    /// `alias` with no arguments
    ListAliases,
    /// `cd [target]`; an empty target leaves the cwd alone
    Cd(String),
    /// `ls` / `dir` with flags
    List(ListFlags),
    DefineAlias { name: String, value: String },
    Unalias(String),
}

/// A single matcher: returns the built-in if it recognizes `command`.
pub type Matcher = fn(&str) -> Option<Builtin>;

/// Matchers in priority order.
pub const MATCHERS: &[(&str, Matcher)] = &[
    ("clear", match_clear),
    ("pwd", match_pwd),
    ("history", match_history),
    ("alias", match_list_aliases),
    ("cd", match_cd),
    ("ls", match_list),
    ("alias-define", match_define_alias),
    ("unalias", match_unalias),
];

impl Builtin {
    /// First matcher that claims the trimmed `command`.
    pub fn parse(command: &str) -> Option<Builtin> {
        MATCHERS.iter().find_map(|(_, matcher)| matcher(command))
    }

    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Builtin::Clear => "clear",
            Builtin::Pwd => "pwd",
            Builtin::History => "history",
            Builtin::ListAliases => "alias",
            Builtin::Cd(_) => "cd",
            Builtin::List(_) => "ls",
            Builtin::DefineAlias { .. } => "alias-define",
            Builtin::Unalias(_) => "unalias",
        }
    }
}

pub fn match_clear(command: &str) -> Option<Builtin> {
    matches!(command, "clear" | "cls").then_some(Builtin::Clear)
}

pub fn match_pwd(command: &str) -> Option<Builtin> {
    (command == "pwd").then_some(Builtin::Pwd)
}

pub fn match_history(command: &str) -> Option<Builtin> {
    (command == "history").then_some(Builtin::History)
}

pub fn match_list_aliases(command: &str) -> Option<Builtin> {
    (command == "alias").then_some(Builtin::ListAliases)
}

pub fn match_cd(command: &str) -> Option<Builtin> {
    if command == "cd" {
        return Some(Builtin::Cd(String::new()));
    }
    let rest = strip_command_word(command, "cd")?;
    Some(Builtin::Cd(rest.trim().to_string()))
}

pub fn match_list(command: &str) -> Option<Builtin> {
    ["ls", "dir"].iter().find_map(|word| {
        if command == *word {
            return Some(Builtin::List(ListFlags::default()));
        }
        let rest = strip_command_word(command, word)?;
        Some(Builtin::List(ListFlags::parse(rest.split_whitespace())))
    })
}

pub fn match_define_alias(command: &str) -> Option<Builtin> {
    let caps = ALIAS_DEFINITION.captures(command)?;
    let name = caps.get(1)?.as_str();
    let value = strip_matching_quotes(caps.get(2)?.as_str().trim());
    if value.is_empty() {
        return None;
    }
    Some(Builtin::DefineAlias {
        name: name.to_string(),
        value: value.to_string(),
    })
}

pub fn match_unalias(command: &str) -> Option<Builtin> {
    let caps = UNALIAS.captures(command)?;
    Some(Builtin::Unalias(caps.get(1)?.as_str().to_string()))
}

/// Text after `word` when `command` is `word` followed by whitespace.
fn strip_command_word<'a>(command: &'a str, word: &str) -> Option<&'a str> {
    let rest = command.strip_prefix(word)?;
    rest.starts_with(char::is_whitespace).then_some(rest)
}

fn strip_matching_quotes(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_builtins() {
        assert_eq!(Builtin::parse("clear"), Some(Builtin::Clear));
        assert_eq!(Builtin::parse("cls"), Some(Builtin::Clear));
        assert_eq!(Builtin::parse("pwd"), Some(Builtin::Pwd));
        assert_eq!(Builtin::parse("history"), Some(Builtin::History));
        assert_eq!(Builtin::parse("alias"), Some(Builtin::ListAliases));
    }

    #[test]
    fn test_exact_builtins_do_not_take_arguments() {
        assert_eq!(Builtin::parse("pwd -P"), None);
        assert_eq!(Builtin::parse("history 10"), None);
        assert_eq!(Builtin::parse("clear screen"), None);
    }

    #[test]
    fn test_cd() {
        assert_eq!(Builtin::parse("cd"), Some(Builtin::Cd(String::new())));
        assert_eq!(Builtin::parse("cd .."), Some(Builtin::Cd("..".into())));
        assert_eq!(
            Builtin::parse("cd   ~/My Documents"),
            Some(Builtin::Cd("~/My Documents".into()))
        );
        assert_eq!(Builtin::parse("cdrecord"), None);
    }

    #[test]
    fn test_list() {
        assert_eq!(
            Builtin::parse("ls"),
            Some(Builtin::List(ListFlags::default()))
        );
        assert_eq!(
            Builtin::parse("ls -la"),
            Some(Builtin::List(ListFlags {
                all: true,
                long: true
            }))
        );
        assert_eq!(
            Builtin::parse("dir /a"),
            Some(Builtin::List(ListFlags {
                all: true,
                long: false
            }))
        );
        assert_eq!(Builtin::parse("lsblk"), None);
        assert_eq!(Builtin::parse("dirname x"), None);
    }

    #[test]
    fn test_define_alias() {
        assert_eq!(
            Builtin::parse("alias gs=git status"),
            Some(Builtin::DefineAlias {
                name: "gs".into(),
                value: "git status".into()
            })
        );
        assert_eq!(
            Builtin::parse(r#"alias ll="ls -la""#),
            Some(Builtin::DefineAlias {
                name: "ll".into(),
                value: "ls -la".into()
            })
        );
        assert_eq!(
            Builtin::parse("alias q='exit'"),
            Some(Builtin::DefineAlias {
                name: "q".into(),
                value: "exit".into()
            })
        );
        // mismatched quotes are kept
        assert_eq!(
            Builtin::parse(r#"alias x="echo 'hi'"#),
            Some(Builtin::DefineAlias {
                name: "x".into(),
                value: r#""echo 'hi'"#.into()
            })
        );
    }

    #[test]
    fn test_define_alias_rejects_bad_names() {
        // not claimed by any matcher, so it runs as an external command
        assert_eq!(Builtin::parse("alias my-alias=ls"), None);
        assert_eq!(Builtin::parse("alias x=\"\""), None);
    }

    #[test]
    fn test_unalias() {
        assert_eq!(
            Builtin::parse("unalias ll"),
            Some(Builtin::Unalias("ll".into()))
        );
        assert_eq!(Builtin::parse("unalias ll la"), None);
    }

    #[test]
    fn test_external_commands() {
        assert_eq!(Builtin::parse("echo hi"), None);
        assert_eq!(Builtin::parse("ll"), None);
        assert_eq!(Builtin::parse("git status"), None);
    }

    #[test]
    fn test_matchers_are_independent() {
        assert_eq!(match_pwd("cd /"), None);
        assert_eq!(match_cd("pwd"), None);
        assert_eq!(match_unalias("alias a=b"), None);
        assert_eq!(MATCHERS.len(), 8);
    }
}
