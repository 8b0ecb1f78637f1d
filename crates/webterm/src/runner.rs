//! Host command execution
//!
//! Anything the dispatcher does not handle itself is handed to the host's
//! command interpreter (`sh -c` / `cmd /C`), so pipes, redirects, quoting and
//! globbing behave exactly like a local shell.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use crate::error::{Error, Result};

/// Default interpreter invocation for this platform.
#[cfg(not(windows))]
pub const DEFAULT_SHELL: &str = "/bin/sh";
#[cfg(windows)]
pub const DEFAULT_SHELL: &str = "cmd";

/// Environment overrides applied on top of the inherited environment.
/// `PWD` is added per command.
pub const DEFAULT_ENV: &[(&str, &str)] = &[
    ("TERM", "xterm-256color"),
    ("LANG", "en_US.UTF-8"),
    ("SHELL", "/bin/bash"),
];

/// Exit code reported when the process ended without one (killed by a signal).
pub const NO_EXIT_CODE: i32 = -1;

/// Captured result of a finished subprocess.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl RunOutput {
    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Spawns commands through the host interpreter.
#[derive(Debug, Clone)]
pub struct SubprocessRunner {
    shell: PathBuf,
    env: HashMap<String, String>,
    timeout: Duration,
}

impl SubprocessRunner {
    /// Runner with the platform interpreter and default environment overrides.
    pub fn new(timeout: Duration) -> Self {
        Self {
            shell: PathBuf::from(DEFAULT_SHELL),
            env: DEFAULT_ENV
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            timeout,
        }
    }

    /// Use a different interpreter binary.
    pub fn shell(mut self, shell: impl Into<PathBuf>) -> Self {
        self.shell = shell.into();
        self
    }

    /// Add or replace an environment override.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `command` in `cwd`, waiting for it to finish or time out.
    ///
    /// stdin is closed; stdout and stderr are captured in full. A process
    /// that outlives the timeout is killed along with everything it started
    /// (its whole process group on unix) and [`Error::Timeout`] returned.
    pub async fn run(&self, command: &str, cwd: &Path) -> Result<RunOutput> {
        let mut cmd = self.build_command(command);
        cmd.current_dir(cwd)
            .envs(&self.env)
            .env("PWD", cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own process group, so a timeout takes down everything the shell forked
        #[cfg(unix)]
        cmd.process_group(0);

        let child = cmd.spawn().map_err(|e| Error::Spawn(e.to_string()))?;
        let pid = child.id();

        // Dropping the wait future on timeout drops the child, which kills it
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(output) => output.map_err(|e| Error::Spawn(e.to_string()))?,
            Err(_elapsed) => {
                kill_process_group(pid);
                return Err(Error::Timeout(self.timeout));
            }
        };

        Ok(RunOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code().unwrap_or(NO_EXIT_CODE),
        })
    }

    #[cfg(not(windows))]
    fn build_command(&self, command: &str) -> Command {
        let mut cmd = Command::new(&self.shell);
        cmd.arg("-c").arg(command);
        cmd
    }

    #[cfg(windows)]
    fn build_command(&self, command: &str) -> Command {
        let mut cmd = Command::new(&self.shell);
        cmd.arg("/C").arg(command);
        cmd
    }
}

#[cfg(unix)]
fn kill_process_group(pid: Option<u32>) {
    let Some(pgid) = pid.and_then(|p| libc::pid_t::try_from(p).ok()) else {
        return;
    };
    // SAFETY: killpg has no memory-safety preconditions
    if unsafe { libc::killpg(pgid, libc::SIGKILL) } != 0 {
        tracing::debug!(
            pgid,
            error = %std::io::Error::last_os_error(),
            "process group already gone"
        );
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: Option<u32>) {}
