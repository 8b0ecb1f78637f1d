//! Per-client session state

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::alias::AliasTable;

/// Front-end color theme.
///
/// The four built-in names are recognized; anything else is kept verbatim so
/// the front end can experiment without a server change.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Theme {
    #[default]
    Dark,
    Light,
    Hacker,
    Matrix,
    Custom(String),
}

impl Theme {
    pub fn as_str(&self) -> &str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
            Theme::Hacker => "hacker",
            Theme::Matrix => "matrix",
            Theme::Custom(name) => name,
        }
    }

    pub fn is_builtin(&self) -> bool {
        !matches!(self, Theme::Custom(_))
    }
}

impl From<String> for Theme {
    fn from(name: String) -> Self {
        match name.as_str() {
            "dark" => Theme::Dark,
            "light" => Theme::Light,
            "hacker" => Theme::Hacker,
            "matrix" => Theme::Matrix,
            _ => Theme::Custom(name),
        }
    }
}

impl From<&str> for Theme {
    fn from(name: &str) -> Self {
        Theme::from(name.to_string())
    }
}

impl From<Theme> for String {
    fn from(theme: Theme) -> Self {
        theme.as_str().to_string()
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of one terminal session: working directory, aliases and theme.
///
/// This is also the persisted session record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Absolute path of an existing directory
    pub cwd: PathBuf,
    #[serde(default)]
    pub aliases: AliasTable,
    #[serde(default)]
    pub theme: Theme,
}

impl Session {
    /// Fresh session in `cwd` with default aliases and theme.
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            aliases: AliasTable::default(),
            theme: Theme::default(),
        }
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn cwd_string(&self) -> String {
        self.cwd.to_string_lossy().into_owned()
    }
}

/// Who the server runs as, used for the prompt and `~` expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user: String,
    pub host: String,
    pub home: PathBuf,
}

impl Identity {
    /// Resolve user, host and home directory from the environment.
    pub fn detect() -> Self {
        let user = std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "user".to_string());

        let host = std::env::var("HOSTNAME")
            .or_else(|_| std::env::var("HOST"))
            .ok()
            .or_else(read_hostname_file)
            .unwrap_or_else(|| "localhost".to_string());

        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from(format!("/home/{}", user)));

        Self { user, host, home }
    }
}

fn read_hostname_file() -> Option<String> {
    let name = std::fs::read_to_string("/etc/hostname").ok()?;
    let name = name.trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_roundtrip_builtin() {
        for name in ["dark", "light", "hacker", "matrix"] {
            let theme = Theme::from(name);
            assert!(theme.is_builtin());
            assert_eq!(theme.as_str(), name);
        }
    }

    #[test]
    fn test_theme_custom_kept_verbatim() {
        let theme = Theme::from("Solarized Dark");
        assert_eq!(theme, Theme::Custom("Solarized Dark".to_string()));
        assert_eq!(String::from(theme), "Solarized Dark");
    }

    #[test]
    fn test_session_record_json() {
        let session = Session::new("/tmp");
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["cwd"], "/tmp");
        assert_eq!(json["theme"], "dark");
        assert_eq!(json["aliases"]["ll"], "ls -la");

        let back: Session = serde_json::from_value(json).unwrap();
        assert_eq!(back, session);
    }

    #[test]
    fn test_session_record_defaults_missing_fields() {
        let session: Session = serde_json::from_str(r#"{"cwd": "/srv"}"#).unwrap();
        assert_eq!(session.cwd, PathBuf::from("/srv"));
        assert_eq!(session.theme, Theme::Dark);
        assert_eq!(session.aliases, AliasTable::default());
    }

    #[test]
    fn test_identity_detect_is_populated() {
        let identity = Identity::detect();
        assert!(!identity.user.is_empty());
        assert!(!identity.host.is_empty());
        assert!(identity.home.is_absolute() || cfg!(windows));
    }
}
