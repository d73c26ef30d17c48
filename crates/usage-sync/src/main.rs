//! usage-sync - CLI entry point
//!
//! Runs the synchronization engine in the foreground, runs a single cycle,
//! or manages the configuration file.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use chrono::Utc;
use clap::{Parser, Subcommand};
use claude_usage::{platform_store, UsageClient};
use tokio::signal;
use tokio::signal::unix::{signal as unix_signal, Signal, SignalKind};
use tracing::{info, warn};
use usage_sync::config::{default, xdg, Config, ConfigLoader};
use usage_sync::render::render_summary;
use usage_sync::{logging, EngineConfig, EngineHandle, SyncEngine};

/// Claude usage synchronization
#[derive(Parser)]
#[command(name = "usage-sync")]
#[command(version, about = "Keeps Claude rate-limit usage and local stats in sync")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands for the usage-sync CLI
#[derive(Subcommand)]
enum Commands {
    /// Run the engine in the foreground and print every state change
    Watch {
        /// Configuration file (defaults to the XDG location)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Run one cycle to completion and print the result
    Once {
        /// Configuration file (defaults to the XDG location)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Print the full state as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Actions for the `config` subcommand.
#[derive(Subcommand)]
enum ConfigAction {
    /// Create default configuration file
    Init {
        /// Overwrite existing configuration (creates backup)
        #[arg(long)]
        force: bool,
    },
    /// Show configuration file path
    Path,
    /// Validate configuration file
    Validate {
        /// File to validate instead of the default location
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Watch { config: None }) {
        Commands::Watch { config } => run_watch(config.as_deref()),
        Commands::Once { config, json } => run_once(config.as_deref(), json),
        Commands::Config { action } => run_config_command(action),
    }
}

/// Loads configuration, installs logging and builds the engine.
fn prepare(path: Option<&Path>) -> Result<(SyncEngine, EngineHandle), ExitCode> {
    let config: Config = ConfigLoader::load(path).map_err(|e| {
        eprintln!("Config error: {e}");
        ExitCode::FAILURE
    })?;

    if let Err(e) = logging::init(&config.logging) {
        eprintln!("Error: failed to initialize logging: {e}");
        return Err(ExitCode::FAILURE);
    }

    let engine_config = EngineConfig::from_section(&config.engine);
    let timeout = config.engine.request_timeout();
    let (engine_config, timeout) = match (engine_config, timeout) {
        (Ok(engine_config), Ok(timeout)) => (engine_config, timeout),
        (Err(e), _) | (_, Err(e)) => {
            eprintln!("Config error: {e}");
            return Err(ExitCode::FAILURE);
        }
    };

    let client = UsageClient::new(timeout).map_err(|e| {
        eprintln!("Error: {e}");
        ExitCode::FAILURE
    })?;

    Ok(SyncEngine::new(
        Arc::new(client),
        platform_store(),
        engine_config,
    ))
}

fn runtime() -> Result<tokio::runtime::Runtime, ExitCode> {
    tokio::runtime::Runtime::new().map_err(|e| {
        eprintln!("Error: failed to create tokio runtime: {e}");
        ExitCode::FAILURE
    })
}

fn run_watch(path: Option<&Path>) -> ExitCode {
    let (engine, handle) = match prepare(path) {
        Ok(parts) => parts,
        Err(code) => return code,
    };
    let rt = match runtime() {
        Ok(rt) => rt,
        Err(code) => return code,
    };

    rt.block_on(async {
        let task = tokio::spawn(engine.run());
        watch_until_shutdown(&handle).await;
        handle.quit().await;
        if let Err(e) = task.await {
            warn!(error = %e, "engine task ended abnormally");
        }
    });

    info!("usage-sync stopped");
    ExitCode::SUCCESS
}

/// Prints each published state until SIGINT or SIGTERM. SIGUSR1 requests a
/// refresh.
async fn watch_until_shutdown(handle: &EngineHandle) {
    let mut updates = handle.subscribe();
    let mut sigterm = register(SignalKind::terminate(), "SIGTERM");
    let mut sigusr1 = register(SignalKind::user_defined1(), "SIGUSR1");

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    info!("engine stopped publishing");
                    break;
                }
                let state = updates.borrow_and_update().clone();
                println!("{}\n", render_summary(&state, Utc::now()));
            }
            Some(()) = next_signal(&mut sigusr1) => {
                info!("received SIGUSR1, refreshing");
                handle.refresh();
            }
            _ = signal::ctrl_c() => {
                info!("received SIGINT (Ctrl+C), shutting down");
                break;
            }
            Some(()) = next_signal(&mut sigterm) => {
                info!("received SIGTERM, shutting down");
                break;
            }
        }
    }
}

fn register(kind: SignalKind, name: &'static str) -> Option<Signal> {
    match unix_signal(kind) {
        Ok(signal) => Some(signal),
        Err(e) => {
            warn!(error = %e, signal = name, "could not register signal handler");
            None
        }
    }
}

async fn next_signal(signal: &mut Option<Signal>) -> Option<()> {
    match signal {
        Some(signal) => signal.recv().await,
        None => std::future::pending().await,
    }
}

fn run_once(path: Option<&Path>, json: bool) -> ExitCode {
    let (mut engine, _handle) = match prepare(path) {
        Ok(parts) => parts,
        Err(code) => return code,
    };
    let rt = match runtime() {
        Ok(rt) => rt,
        Err(code) => return code,
    };

    let state = rt.block_on(engine.refresh_once());

    if json {
        match serde_json::to_string_pretty(&state) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                eprintln!("Error: failed to serialize state: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        println!("{}", render_summary(&state, Utc::now()));
    }
    ExitCode::SUCCESS
}

fn run_config_command(action: ConfigAction) -> ExitCode {
    let result = match action {
        ConfigAction::Init { force } => default::create_default_config(force).map(|path| {
            println!("Created configuration at {}", path.display());
        }),
        ConfigAction::Path => xdg::config_path().map(|path| {
            println!("{}", path.display());
        }),
        ConfigAction::Validate { config } => ConfigLoader::load(config.as_deref())
            .and_then(|config| config.validate().map(|()| config))
            .map(|config| {
                println!("Configuration is valid");
                println!("{config:#?}");
            }),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Config error: {e}");
            ExitCode::FAILURE
        }
    }
}
