//! Webterm CLI - HTTP backend for a browser terminal
//!
//! Usage:
//!   webterm serve                          # Serve on 127.0.0.1:8080, state under the data dir
//!   webterm serve --bind 0.0.0.0:9000 --memory
//!   webterm -c 'ls -la'                    # Run one command and print its output

mod server;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use webterm::{
    CLEAR_SENTINEL, CommandLogging, DEFAULT_MAX_HISTORY, ExecutionLimits, FileStore, LogConfig,
    MemoryStore, SessionStore, Terminal,
};

/// Webterm - browser terminal backend
#[derive(Parser, Debug)]
#[command(name = "webterm")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Execute the given command string and exit
    #[arg(short = 'c')]
    command: Option<String>,

    #[command(subcommand)]
    subcommand: Option<SubCmd>,
}

#[derive(Subcommand, Debug)]
enum SubCmd {
    /// Serve terminal sessions over HTTP
    Serve(ServeArgs),
}

#[derive(clap::Args, Debug)]
struct ServeArgs {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:8080")]
    bind: SocketAddr,

    /// Directory holding per-session history and state
    #[arg(long)]
    state_dir: Option<PathBuf>,

    /// Keep sessions in memory only
    #[arg(long, conflicts_with = "state_dir")]
    memory: bool,

    /// Seconds an external command may run before it is killed
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// History entries kept per session
    #[arg(long, default_value_t = DEFAULT_MAX_HISTORY)]
    max_history: usize,

    /// How much command text goes into the logs
    #[arg(long, value_enum, default_value_t = LogCommands::Size)]
    log_commands: LogCommands,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum LogCommands {
    /// Byte length only
    Size,
    /// Text with secrets masked
    Redacted,
    /// Text as typed
    Verbatim,
}

impl From<LogCommands> for CommandLogging {
    fn from(mode: LogCommands) -> Self {
        match mode {
            LogCommands::Size => CommandLogging::SizeOnly,
            LogCommands::Redacted => CommandLogging::Redacted,
            LogCommands::Verbatim => CommandLogging::Verbatim,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(if args.command.is_some() { "warn" } else { "info" });

    if let Some(SubCmd::Serve(serve)) = args.subcommand {
        return run_server(serve).await;
    }

    if let Some(cmd) = args.command {
        let terminal = Terminal::builder().session_id("cli").build();
        let result = terminal
            .execute(&cmd)
            .await
            .context("Failed to execute command")?;
        for line in result.output.iter().filter(|l| *l != CLEAR_SENTINEL) {
            println!("{}", line);
        }
        return Ok(());
    }

    eprintln!("Usage: webterm serve [--bind ADDR] or webterm -c 'command'");
    std::process::exit(1);
}

async fn run_server(args: ServeArgs) -> Result<()> {
    let store: Arc<dyn SessionStore> = if args.memory {
        Arc::new(MemoryStore::new())
    } else {
        let dir = match args.state_dir {
            Some(dir) => dir,
            None => default_state_dir()?,
        };
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create state directory: {}", dir.display()))?;
        tracing::info!(dir = %dir.display(), "using file store");
        Arc::new(FileStore::new(dir))
    };

    let limits = ExecutionLimits::new()
        .timeout(Duration::from_secs(args.timeout))
        .max_history(args.max_history);

    let terminal = Terminal::builder()
        .store(store)
        .limits(limits)
        .log_config(LogConfig::new().commands(args.log_commands.into()))
        .build();
    server::serve(args.bind, terminal).await
}

fn default_state_dir() -> Result<PathBuf> {
    let base = dirs::data_local_dir().context("No data directory for this platform; pass --state-dir")?;
    Ok(base.join("webterm").join("sessions"))
}

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
