#![forbid(unsafe_code)]

//! `proman`: declarative process supervisor binary.
//!
//! Resolves a YAML process document, starts the active processes, and
//! serves the HTTP and IPC control surfaces until a shutdown signal.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use proman::config::SupervisorConfig;
use proman::http::server::serve_http;
use proman::ipc::server::spawn_ipc_server;
use proman::monitor::spawn_exit_monitor;
use proman::registry::KindRegistry;
use proman::resolver::ConfigResolver;
use proman::{AppError, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "proman", about = "Declarative process supervisor", version, long_about = None)]
struct Cli {
    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Resolve a process document and supervise its processes.
    Run {
        /// Path to the YAML process document.
        config: PathBuf,

        /// Path to the TOML supervisor settings.
        #[arg(long)]
        settings: Option<PathBuf>,

        /// Override the HTTP bind host.
        #[arg(long)]
        host: Option<String>,

        /// Override the HTTP bind port.
        #[arg(long)]
        port: Option<u16>,

        /// Run without the HTTP control surface.
        #[arg(long)]
        headless: bool,

        /// Run without the IPC control surface.
        #[arg(long)]
        no_ipc: bool,
    },

    /// Resolve a process document without starting anything.
    Check {
        /// Path to the YAML process document.
        config: PathBuf,
    },

    /// List the registered process kinds.
    Kinds,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;

    match args.command {
        Command::Run {
            config,
            settings,
            host,
            port,
            headless,
            no_ipc,
        } => {
            let mut settings = match settings {
                Some(path) => SupervisorConfig::load_from_path(path)?,
                None => SupervisorConfig::default(),
            };
            if let Some(host) = host {
                settings.http.host = host;
            }
            if let Some(port) = port {
                settings.http.port = port;
            }
            if no_ipc {
                settings.ipc.enabled = false;
            }

            tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
                .block_on(run(config, settings, headless))
        }
        Command::Check { config } => check(&config),
        Command::Kinds => {
            let registry = KindRegistry::with_builtin_kinds()?;
            for kind in registry.kinds() {
                println!("{kind}");
            }
            Ok(())
        }
    }
}

async fn run(config: PathBuf, settings: SupervisorConfig, headless: bool) -> Result<()> {
    info!(document = %config.display(), "proman bootstrap");

    // ── Resolve processes ───────────────────────────────
    let registry = KindRegistry::with_builtin_kinds()?;
    let manager = ConfigResolver::new(&registry)
        .with_stop_timeout(settings.stop_timeout())
        .init_process_manager(&config)
        .await?;
    let manager = Arc::new(manager);
    info!(processes = ?manager.status().await, "process manager ready");

    // ── Background services ─────────────────────────────
    let ct = CancellationToken::new();
    let monitor_handle = spawn_exit_monitor(
        Arc::clone(&manager),
        settings.exit_poll_interval(),
        ct.clone(),
    );

    let ipc_handle = if settings.ipc.enabled {
        match spawn_ipc_server(&settings.ipc.name, Arc::clone(&manager), ct.clone()) {
            Ok(handle) => Some(handle),
            Err(err) => {
                warn!(%err, "IPC control surface unavailable");
                None
            }
        }
    } else {
        info!("IPC control surface disabled");
        None
    };

    let http_handle = if headless {
        info!("headless mode; HTTP control surface disabled");
        None
    } else {
        let http_ct = ct.clone();
        let http_manager = Arc::clone(&manager);
        let host = settings.http.host.clone();
        let port = settings.http.port;
        Some(tokio::spawn(async move {
            if let Err(err) = serve_http(http_manager, &host, port, http_ct).await {
                error!(%err, "HTTP control surface failed");
            }
        }))
    };

    // ── Wait for shutdown signal ────────────────────────
    shutdown_signal().await;
    info!("shutdown signal received");
    ct.cancel();

    for outcome in manager.stop_all().await {
        if !outcome.ok {
            warn!(name = %outcome.name, message = %outcome.message, "process did not stop cleanly");
        }
    }

    // ── Wait for background tasks ───────────────────────
    let _ = monitor_handle.await;
    if let Some(handle) = ipc_handle {
        let _ = handle.await;
    }
    if let Some(handle) = http_handle {
        let _ = handle.await;
    }
    info!("proman shut down");

    Ok(())
}

fn check(config: &Path) -> Result<()> {
    let registry = KindRegistry::with_builtin_kinds()?;
    let processes = ConfigResolver::new(&registry).parse_file(config)?;
    for (entry, process) in &processes {
        println!(
            "{entry}: {} ({}, active={})",
            process.name(),
            process.kind(),
            process.is_active()
        );
    }
    info!(count = processes.len(), "process document is valid");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                warn!(%err, "failed to register SIGTERM handler, using ctrl-c only");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = ctrl_c.await {
            error!(%err, "ctrl-c signal handler failed");
        }
    }
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(env_filter).with_writer(std::io::stderr);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
