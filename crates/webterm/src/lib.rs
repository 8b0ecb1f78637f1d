//! Webterm - command backend for a browser terminal
//!
//! Takes free-text commands from a web front end, handles a handful of
//! built-ins itself (`cd`, `ls`, `pwd`, `history`, `alias`, ...), expands
//! per-session aliases, refuses commands on a denylist and hands everything
//! else to the host's command interpreter. Results come back as
//! serializable envelopes the front end renders.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use webterm::{MemoryStore, Terminal};
//!
//! #[tokio::main]
//! async fn main() -> webterm::Result<()> {
//!     let terminal = Terminal::builder()
//!         .store(Arc::new(MemoryStore::new()))
//!         .session_id("demo")
//!         .default_cwd("/")
//!         .build();
//!
//!     let result = terminal.execute("pwd").await?;
//!     assert_eq!(result.output, vec!["/".to_string()]);
//!     assert_eq!(terminal.history().await?.len(), 1);
//!     Ok(())
//! }
//! ```
//!
//! # Security
//!
//! The denylist is a best-effort substring filter, not a sandbox. Anything
//! the host interpreter can run, a client can run in a way the list does not
//! anticipate. Put the server behind authentication.

mod alias;
mod builtins;
mod dispatch;
mod error;
mod history;
mod limits;
mod listing;
mod logging_impl;
mod navigation;
mod prompt;
mod runner;
mod security;
mod session;
mod store;

pub use alias::{AliasTable, DEFAULT_ALIASES};
pub use builtins::Builtin;
pub use dispatch::{Ack, CLEAR_SENTINEL, Dispatcher, ExecutionResult};
pub use error::{Error, Result};
pub use history::{HistoryEntry, HistoryStore, SUGGEST_VOCABULARY, suggest};
pub use limits::{DEFAULT_MAX_HISTORY, ExecutionLimits};
pub use listing::{DirectoryLister, ListFlags};
pub use logging_impl::{CommandLogging, LogConfig, format_command_for_log, sanitize_for_log};
pub use navigation::DirectoryNavigator;
pub use prompt::PromptView;
pub use runner::{RunOutput, SubprocessRunner};
pub use security::{DEFAULT_PATTERNS, Denylist, Verdict};
pub use session::{Identity, Session, Theme};
pub use store::{FileStore, MemoryStore, SessionStore, validate_session_id};

use serde_json::{Value, json};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

/// Session id used when the builder is not given one.
pub const DEFAULT_SESSION_ID: &str = "default";

/// Payload returned by [`Terminal::handle`] for an unrecognized action.
pub const UNKNOWN_ACTION: &str = "Unknown action";

/// Inbound operations, by their wire name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Exec,
    History,
    Suggest,
    ClearHistory,
    Theme,
    Alias,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Exec => "exec",
            Action::History => "history",
            Action::Suggest => "suggest",
            Action::ClearHistory => "clear_history",
            Action::Theme => "theme",
            Action::Alias => "alias",
        }
    }
}

impl FromStr for Action {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "exec" => Ok(Action::Exec),
            "history" => Ok(Action::History),
            "suggest" => Ok(Action::Suggest),
            "clear_history" => Ok(Action::ClearHistory),
            "theme" => Ok(Action::Theme),
            "alias" => Ok(Action::Alias),
            other => Err(Error::UnknownOperation(other.to_string())),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One client's terminal.
///
/// Every operation reads the session's documents from the store, applies
/// itself and writes back what changed. A `Terminal` is cheap to clone;
/// [`Terminal::with_session`] re-targets a clone at another session id.
#[derive(Clone)]
pub struct Terminal {
    store: Arc<dyn SessionStore>,
    dispatcher: Arc<Dispatcher>,
    session_id: String,
    limits: ExecutionLimits,
    default_cwd: PathBuf,
}

impl fmt::Debug for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Terminal")
            .field("session_id", &self.session_id)
            .field("limits", &self.limits)
            .field("default_cwd", &self.default_cwd)
            .finish_non_exhaustive()
    }
}

impl Terminal {
    /// Create a new TerminalBuilder for customized configuration.
    pub fn builder() -> TerminalBuilder {
        TerminalBuilder::default()
    }

    /// Same configuration and store, different session.
    pub fn with_session(&self, session_id: impl Into<String>) -> Terminal {
        Terminal {
            session_id: session_id.into(),
            ..self.clone()
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn limits(&self) -> &ExecutionLimits {
        &self.limits
    }

    pub fn identity(&self) -> &Identity {
        self.dispatcher.identity()
    }

    /// Run one line of input.
    ///
    /// Command failures are reported inside the envelope; only store errors
    /// come back as `Err`.
    pub async fn execute(&self, command: &str) -> Result<ExecutionResult> {
        let mut session = self.load_session().await?;
        let mut history = self.load_history().await?;

        let result = self
            .dispatcher
            .dispatch(&mut session, &mut history, command)
            .await;

        if !command.trim().is_empty() {
            self.store
                .save_history(&self.session_id, &history.list())
                .await?;
            self.store.save_session(&self.session_id, &session).await?;
        }
        Ok(result)
    }

    /// Newest-first history.
    pub async fn history(&self) -> Result<Vec<HistoryEntry>> {
        Ok(self.load_history().await?.list())
    }

    /// Completion candidates for `prefix`.
    pub async fn suggest(&self, prefix: &str) -> Result<Vec<String>> {
        let session = self.load_session().await?;
        Ok(history::suggest(prefix, &session.aliases))
    }

    pub async fn clear_history(&self) -> Result<Ack> {
        self.store.save_history(&self.session_id, &[]).await?;
        tracing::info!(session = %self.session_id, "history cleared");
        Ok(Ack::ok())
    }

    /// Store the front-end theme. Names are not validated.
    pub async fn set_theme(&self, name: &str) -> Result<Ack> {
        let mut session = self.load_session().await?;
        session.theme = Theme::from(name);
        self.store.save_session(&self.session_id, &session).await?;
        Ok(Ack::ok())
    }

    pub async fn theme(&self) -> Result<Theme> {
        Ok(self.load_session().await?.theme)
    }

    /// Alias name to expansion, in name order.
    pub async fn aliases(&self) -> Result<BTreeMap<String, String>> {
        Ok(self.load_session().await?.aliases.to_map())
    }

    /// Prompt for the session's current directory.
    pub async fn prompt(&self) -> Result<PromptView> {
        let session = self.load_session().await?;
        Ok(self.dispatcher.prompt(&session))
    }

    /// Run an operation by wire name, returning its JSON payload.
    ///
    /// `arg` is the command for `exec`, the prefix for `suggest` and the
    /// theme name for `theme`; other actions ignore it. An unknown action
    /// yields `{"error": "Unknown action"}` rather than an error.
    pub async fn handle(&self, action: &str, arg: &str) -> Result<Value> {
        let action = match action.parse::<Action>() {
            Ok(action) => action,
            Err(e) => {
                tracing::debug!(error = %e, "rejected action");
                return Ok(json!({ "error": UNKNOWN_ACTION }));
            }
        };

        let value = match action {
            Action::Exec => serde_json::to_value(self.execute(arg).await?)?,
            Action::History => serde_json::to_value(self.history().await?)?,
            Action::Suggest => serde_json::to_value(self.suggest(arg).await?)?,
            Action::ClearHistory => serde_json::to_value(self.clear_history().await?)?,
            Action::Theme => serde_json::to_value(self.set_theme(arg).await?)?,
            Action::Alias => serde_json::to_value(self.aliases().await?)?,
        };
        Ok(value)
    }

    async fn load_session(&self) -> Result<Session> {
        match self.store.load_session(&self.session_id).await? {
            Some(mut session) => {
                if !session.cwd.is_dir() {
                    tracing::warn!(
                        session = %self.session_id,
                        cwd = %session.cwd.display(),
                        "saved working directory is gone, resetting"
                    );
                    session.cwd = self.default_cwd.clone();
                }
                Ok(session)
            }
            None => {
                tracing::info!(session = %self.session_id, "new session");
                Ok(Session::new(self.default_cwd.clone()))
            }
        }
    }

    async fn load_history(&self) -> Result<HistoryStore> {
        let entries = self.store.load_history(&self.session_id).await?;
        Ok(HistoryStore::from_entries(entries, self.limits.max_history))
    }
}

/// Builder for customized Terminal configuration.
#[derive(Default)]
pub struct TerminalBuilder {
    store: Option<Arc<dyn SessionStore>>,
    session_id: Option<String>,
    limits: ExecutionLimits,
    env: HashMap<String, String>,
    shell: Option<PathBuf>,
    identity: Option<Identity>,
    home: Option<PathBuf>,
    default_cwd: Option<PathBuf>,
    log_config: LogConfig,
    denylist: Option<Denylist>,
    check_expansions: bool,
}

impl TerminalBuilder {
    /// Set the session store. Defaults to a fresh [`MemoryStore`].
    pub fn store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the session id. Defaults to [`DEFAULT_SESSION_ID`].
    pub fn session_id(mut self, id: impl Into<String>) -> Self {
        self.session_id = Some(id.into());
        self
    }

    /// Set execution limits.
    pub fn limits(mut self, limits: ExecutionLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Add an environment override for spawned commands.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Set the interpreter used for external commands.
    pub fn shell(mut self, shell: impl Into<PathBuf>) -> Self {
        self.shell = Some(shell.into());
        self
    }

    /// Set user, host and home instead of detecting them.
    pub fn identity(mut self, identity: Identity) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Override the home directory used for `~` and the prompt.
    pub fn home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = Some(home.into());
        self
    }

    /// Working directory of new sessions. Defaults to the process cwd.
    pub fn default_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.default_cwd = Some(cwd.into());
        self
    }

    /// Configure what command text reaches the logs.
    pub fn log_config(mut self, config: LogConfig) -> Self {
        self.log_config = config;
        self
    }

    /// Replace the default denylist.
    pub fn denylist(mut self, denylist: Denylist) -> Self {
        self.denylist = Some(denylist);
        self
    }

    /// Screen alias expansions with the denylist too, not only typed input.
    ///
    /// Off by default. With it on, `alias x=rm` makes `x -rf dir` blocked
    /// instead of spawned.
    pub fn check_expansions(mut self, enabled: bool) -> Self {
        self.check_expansions = enabled;
        self
    }

    /// Build the Terminal instance.
    pub fn build(self) -> Terminal {
        let mut identity = self.identity.unwrap_or_else(Identity::detect);
        if let Some(home) = self.home {
            identity.home = home;
        }

        let default_cwd = self
            .default_cwd
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| identity.home.clone());

        let mut runner = SubprocessRunner::new(self.limits.timeout);
        if let Some(shell) = self.shell {
            runner = runner.shell(shell);
        }
        for (key, value) in self.env {
            runner = runner.env(key, value);
        }

        let dispatcher = Dispatcher::new(
            self.denylist.unwrap_or_default(),
            runner,
            identity,
            self.log_config,
        )
        .check_expansions(self.check_expansions);

        Terminal {
            store: self.store.unwrap_or_else(|| Arc::new(MemoryStore::new())),
            dispatcher: Arc::new(dispatcher),
            session_id: self
                .session_id
                .unwrap_or_else(|| DEFAULT_SESSION_ID.to_string()),
            limits: self.limits,
            default_cwd,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terminal() -> Terminal {
        Terminal::builder()
            .identity(Identity {
                user: "tester".into(),
                host: "testhost".into(),
                home: PathBuf::from("/nonexistent-home"),
            })
            .default_cwd("/")
            .build()
    }

    #[test]
    fn test_action_names() {
        for name in ["exec", "history", "suggest", "clear_history", "theme", "alias"] {
            let action: Action = name.parse().unwrap();
            assert_eq!(action.as_str(), name);
        }
        assert!(matches!(
            "shutdown".parse::<Action>(),
            Err(Error::UnknownOperation(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_action_payload() {
        let value = terminal().handle("shutdown", "").await.unwrap();
        assert_eq!(value, json!({"error": "Unknown action"}));
    }

    #[tokio::test]
    async fn test_new_session_defaults() {
        let term = terminal();
        assert_eq!(term.theme().await.unwrap(), Theme::Dark);
        let aliases = term.aliases().await.unwrap();
        assert_eq!(aliases.get("ll").map(String::as_str), Some("ls -la"));
        assert_eq!(aliases.get("la").map(String::as_str), Some("ls -a"));
        let prompt = term.prompt().await.unwrap();
        assert_eq!(prompt.user, "tester");
        assert_eq!(prompt.path, "/");
    }

    #[tokio::test]
    async fn test_theme_round_trips() {
        let term = terminal();
        term.set_theme("matrix").await.unwrap();
        assert_eq!(term.theme().await.unwrap(), Theme::Matrix);
        term.set_theme("solarized").await.unwrap();
        assert_eq!(term.theme().await.unwrap().as_str(), "solarized");
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let first = terminal();
        let second = first.with_session("other");
        first.execute("alias gs=git status").await.unwrap();

        assert!(first.aliases().await.unwrap().contains_key("gs"));
        assert!(!second.aliases().await.unwrap().contains_key("gs"));
        assert!(second.history().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_handle_exec_envelope_shape() {
        let value = terminal().handle("exec", "pwd").await.unwrap();
        assert_eq!(value["output"], json!(["/"]));
        assert_eq!(value["cwd"], json!("/"));
        assert!(value["time"].is_number());
        assert_eq!(value["prompt"]["host"], json!("testhost"));
    }

    #[tokio::test]
    async fn test_invalid_session_id_is_store_error() {
        let term = terminal().with_session("../../etc");
        let err = term.execute("pwd").await.unwrap_err();
        assert!(matches!(err, Error::InvalidSessionId(_)));
    }
}
