//! procsignal
//!
//! A managed server controlled through OS signals, and the companion command
//! that finds a running instance and signals it.
//!
//! # Architecture Overview
//!
//! ```text
//!   procsignal --signal reload[=<pid>]              procsignal (server)
//!   ┌──────────────────────────────────┐            ┌──────────────────────────────┐
//!   │ SignalRequest                    │            │ lifecycle::signals           │
//!   │   → ProcessResolver (pgrep)      │   SIGHUP   │   SIGINT  → close endpoint,  │
//!   │   → CommandDispatcher (kill)  ───┼───────────▶│             exit 0           │
//!   └──────────────────────────────────┘            │   SIGUSR1 → reopen log file  │
//!                                                   │   SIGHUP  → reload config    │
//!                                                   └──────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use procsignal::config::{
    load_config, validate_config, ConfigError, ConfigOverrides, ServerConfig,
};
use procsignal::control::{
    CommandDispatcher, KillSender, PgrepFinder, ProcessResolver, SignalRequest,
};
use procsignal::lifecycle::handle_signals;
use procsignal::observability::init_logging;
use procsignal::Server;

#[derive(Parser)]
#[command(name = "procsignal")]
#[command(about = "Signal-controlled server and its control command", long_about = None)]
struct Cli {
    /// Configuration file (TOML).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Send a lifecycle command to a running instance: stop, quit, reopen,
    /// reload; optionally `=<pid>`.
    #[arg(short = 's', long = "signal", value_name = "COMMAND[=PID]")]
    signal: Option<String>,

    /// Install no signal handlers.
    #[arg(long)]
    disable_signals: bool,

    /// Log filter (overrides the config file).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Log file (overrides the config file).
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Unix socket endpoint (overrides the config file).
    #[arg(long)]
    unix_socket: Option<PathBuf>,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            disable_signals: self.disable_signals,
            log_level: self.log_level.clone(),
            log_file: self.log_file.clone(),
            unix_socket: self.unix_socket.clone(),
        }
    }

    fn load(&self) -> Result<ServerConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => ServerConfig::default(),
        };
        self.overrides().apply(&mut config);
        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match &cli.signal {
        Some(request) => send_signal(&cli, request),
        None => run_server(&cli).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Companion command: resolve the target and deliver one signal.
fn send_signal(cli: &Cli, request: &str) -> Result<(), Box<dyn std::error::Error>> {
    let request: SignalRequest = request.parse()?;
    let config = cli.load()?;

    // Diagnostics only; results are reported on stderr by `main`.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let finder = PgrepFinder::new(&config.process.finder, &config.process.name);
    let resolver = ProcessResolver::new(finder, &config.process.name);
    let dispatcher = CommandDispatcher::new(resolver, KillSender);

    let pid = dispatcher.dispatch(request.command, &request.pid)?;
    tracing::info!(command = %request.command, %pid, "Signal sent");
    Ok(())
}

async fn run_server(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = cli.load()?;
    let logging = init_logging(&config.logging)?;

    tracing::info!(
        pid = std::process::id(),
        name = %config.process.name,
        signals_disabled = config.signals.disable,
        "procsignal starting"
    );

    let signals = config.signals.clone();
    let server = Arc::new(Server::new(
        config,
        cli.config.clone(),
        cli.overrides(),
        logging,
    ));

    let Some(listener) = handle_signals(&signals, server.clone())? else {
        server.run().await?;
        return Ok(());
    };

    tokio::select! {
        state = listener => {
            let state = state?;
            if let Some(code) = state.exit_code() {
                std::process::exit(code);
            }
            tracing::warn!(?state, "Signal listener stopped");
            Ok(())
        }
        result = server.run() => Ok(result?),
    }
}
