//! Command dispatch
//!
//! [`Dispatcher::dispatch`] is the pipeline every typed command goes through:
//! denylist, history, built-ins, alias expansion, and finally the host
//! interpreter. Every failure ends up as an output line; nothing here returns
//! an error to the caller.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::builtins::Builtin;
use crate::error::{Error, Result};
use crate::history::HistoryStore;
use crate::listing::DirectoryLister;
use crate::logging_impl::{LogConfig, format_command_for_log};
use crate::navigation::DirectoryNavigator;
use crate::prompt::PromptView;
use crate::runner::{RunOutput, SubprocessRunner};
use crate::security::{Denylist, Verdict};
use crate::session::{Identity, Session};

/// Output line telling the front end to wipe its scrollback.
pub const CLEAR_SENTINEL: &str = "__CLEAR__";

const ERROR_OUTPUT_BANNER: [&str; 3] = [
    "╔══════════════════════════════╗",
    "║         ERROR OUTPUT         ║",
    "╚══════════════════════════════╝",
];

/// Response envelope for one executed command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionResult {
    pub output: Vec<String>,
    /// Session working directory after the command
    pub cwd: String,
    /// Elapsed wall-clock seconds, rounded to milliseconds
    pub time: f64,
    pub prompt: PromptView,
}

/// Acknowledgement for operations without a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub ok: bool,
}

impl Ack {
    pub fn ok() -> Self {
        Self { ok: true }
    }
}

/// Executes typed commands against a session.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    denylist: Denylist,
    navigator: DirectoryNavigator,
    lister: DirectoryLister,
    runner: SubprocessRunner,
    identity: Identity,
    log_config: LogConfig,
    check_expansions: bool,
}

impl Dispatcher {
    pub fn new(
        denylist: Denylist,
        runner: SubprocessRunner,
        identity: Identity,
        log_config: LogConfig,
    ) -> Self {
        Self {
            denylist,
            navigator: DirectoryNavigator::new(identity.home.clone()),
            lister: DirectoryLister::new(),
            runner,
            identity,
            log_config,
            check_expansions: false,
        }
    }

    /// Also run alias expansions through the denylist before spawning them.
    ///
    /// Off by default: the denylist only ever sees the text as typed.
    pub fn check_expansions(mut self, enabled: bool) -> Self {
        self.check_expansions = enabled;
        self
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Prompt for `session` as it currently stands.
    pub fn prompt(&self, session: &Session) -> PromptView {
        PromptView::new(&self.identity, session.cwd())
    }

    /// Run one line of input.
    ///
    /// Empty input and blocked commands leave the history untouched; anything
    /// else is recorded with the working directory it was typed in, before
    /// it runs.
    pub async fn dispatch(
        &self,
        session: &mut Session,
        history: &mut HistoryStore,
        input: &str,
    ) -> ExecutionResult {
        let command = input.trim();
        if command.is_empty() {
            return self.envelope(session, Vec::new(), Duration::ZERO);
        }

        let start = Instant::now();
        let logged = format_command_for_log(command, &self.log_config);

        if let Err(e) = self.screen(command) {
            tracing::warn!(command = %logged, error = %e, "command blocked");
            return self.envelope(session, vec![error_line(&e)], start.elapsed());
        }

        history.append(command, &session.cwd_string());

        let output = match Builtin::parse(command) {
            Some(builtin) => {
                tracing::debug!(builtin = builtin.name(), "running built-in");
                self.run_builtin(builtin, session, history).await
            }
            None => self.run_external(command, session).await,
        };

        let elapsed = start.elapsed();
        tracing::debug!(
            command = %logged,
            elapsed_ms = elapsed.as_millis() as u64,
            "command finished"
        );
        self.envelope(session, output, elapsed)
    }

    async fn run_builtin(
        &self,
        builtin: Builtin,
        session: &mut Session,
        history: &HistoryStore,
    ) -> Vec<String> {
        match builtin {
            Builtin::Clear => vec![CLEAR_SENTINEL.to_string()],
            Builtin::Pwd => vec![session.cwd_string()],
            Builtin::History => history.format(),
            Builtin::ListAliases => session.aliases.format(),
            Builtin::Cd(target) => {
                let changed = self.navigator.change_directory(&target, session.cwd()).await;
                match changed {
                    Ok(Some(dir)) => {
                        session.cwd = dir;
                        vec![format!("📂 {}", session.cwd_string())]
                    }
                    Ok(None) => Vec::new(),
                    Err(e) => {
                        tracing::debug!(kind = e.kind(), "cd failed");
                        vec![error_line(&e)]
                    }
                }
            }
            Builtin::List(flags) => match self.lister.list(session.cwd(), flags).await {
                Ok(lines) => lines,
                Err(e) => {
                    tracing::warn!(cwd = %session.cwd().display(), error = %e, "listing failed");
                    vec![format!("❌ Cannot read directory: {}", session.cwd_string())]
                }
            },
            Builtin::DefineAlias { name, value } => match session.aliases.add(&name, &value) {
                Ok(()) => vec![format!("✅ Alias created: {} = {}", name, value)],
                Err(e) => vec![error_line(&e)],
            },
            Builtin::Unalias(name) => {
                if session.aliases.remove(&name) {
                    vec![format!("✅ Alias removed: {}", name)]
                } else {
                    vec![format!("❌ Alias not found: {}", name)]
                }
            }
        }
    }

    async fn run_external(&self, command: &str, session: &Session) -> Vec<String> {
        let command = match session.aliases.expand(command) {
            Some(expanded) => {
                if self.check_expansions
                    && let Err(e) = self.screen(&expanded)
                {
                    tracing::warn!(error = %e, "alias expansion blocked");
                    return vec![error_line(&e)];
                }
                expanded
            }
            None => command.to_string(),
        };

        match self.runner.run(&command, session.cwd()).await {
            Ok(output) => render_output(&output),
            Err(e) => {
                match &e {
                    Error::Timeout(_) => tracing::warn!(kind = e.kind(), "command timed out"),
                    _ => tracing::error!(kind = e.kind(), error = %e, "command could not be started"),
                }
                vec![error_line(&e)]
            }
        }
    }

    fn screen(&self, command: &str) -> Result<()> {
        match self.denylist.check(command) {
            Verdict::Allowed => Ok(()),
            Verdict::Blocked { pattern } => Err(Error::Blocked { pattern }),
        }
    }

    fn envelope(&self, session: &Session, output: Vec<String>, elapsed: Duration) -> ExecutionResult {
        ExecutionResult {
            output,
            cwd: session.cwd_string(),
            time: round_millis(elapsed),
            prompt: self.prompt(session),
        }
    }
}

/// Output line for a recovered failure.
pub fn error_line(error: &Error) -> String {
    match error {
        Error::Blocked { pattern } => {
            format!("⛔ Command blocked by security policy: {}", pattern)
        }
        Error::NotFound { target } => format!("❌ Directory not found: {}", target),
        Error::Spawn(reason) => format!("❌ Could not execute command: {}", reason),
        Error::Timeout(limit) => {
            format!("⏱️ Command timed out after {}s", limit.as_secs_f64())
        }
        other => format!("❌ {}", other),
    }
}

/// Turn captured process output into display lines.
pub fn render_output(output: &RunOutput) -> Vec<String> {
    let mut lines = Vec::new();

    if !output.stdout.is_empty() {
        lines.extend(split_lines(&output.stdout));
    }

    if !output.stderr.is_empty() {
        lines.push(String::new());
        lines.extend(ERROR_OUTPUT_BANNER.iter().map(|s| s.to_string()));
        lines.extend(split_lines(&output.stderr));
    }

    if output.stdout.is_empty() && output.stderr.is_empty() {
        lines.push(if output.is_success() {
            "✅ Command executed successfully".to_string()
        } else {
            format!("⚠️ Exit code: {}", output.exit_code)
        });
    }

    lines
}

fn split_lines(text: &str) -> impl Iterator<Item = String> + '_ {
    text.trim_end_matches('\n').split('\n').map(|s| s.to_string())
}

fn round_millis(elapsed: Duration) -> f64 {
    (elapsed.as_secs_f64() * 1000.0).round() / 1000.0
}
