//! Main entry point for the Elo Ranker service
//!
//! Loads configuration, initializes logging, serves the HTTP API and shuts
//! down gracefully on SIGINT or SIGTERM.

use anyhow::Result;
use clap::Parser;
use elo_ranker::config::{validate_config, AppConfig, StorageBackend};
use elo_ranker::http::{ApiServer, ApiServerConfig};
use elo_ranker::service::{AppState, HealthCheck, HealthStatus};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tokio::time::Duration;
use tracing::{error, info, warn};

/// Elo Ranker - player ratings for head-to-head matches
#[derive(Parser)]
#[command(
    name = "elo-ranker",
    version,
    about = "Rating service for head-to-head matches using the Elo system",
    long_about = "Elo Ranker registers players, updates their Elo ratings from reported \
                 match results, serves the current ranking over HTTP and pushes every \
                 rating change to subscribers as server-sent events."
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Perform health check and exit
    #[arg(long, help = "Perform a health check and exit with status code")]
    health_check: bool,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    #[arg(long, value_name = "HOST", help = "Override HTTP bind host")]
    host: Option<String>,

    /// HTTP port override
    #[arg(long, value_name = "PORT", help = "Override HTTP server port")]
    http_port: Option<u16>,

    #[arg(
        long,
        value_name = "BACKEND",
        help = "Override player storage backend (memory, file)"
    )]
    storage: Option<StorageBackend>,

    #[arg(
        long,
        value_name = "FILE",
        help = "Override the JSON data file used by the file backend"
    )]
    data_file: Option<PathBuf>,

    #[arg(
        long = "cors-origin",
        value_name = "ORIGIN",
        help = "Allowed browser origin (repeatable, replaces the configured list)"
    )]
    cors_origins: Vec<String>,

    /// Enable debug mode
    #[arg(short, long, help = "Enable debug mode with verbose logging")]
    debug: bool,

    /// Dry run mode (validate config and exit)
    #[arg(
        long,
        help = "Validate configuration and exit without starting service"
    )]
    dry_run: bool,
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Perform health check and return appropriate exit code
async fn perform_health_check(config: AppConfig) -> Result<()> {
    info!("Performing health check...");

    let app_state = AppState::new(config)?;
    app_state.start().await?;

    let health = HealthCheck::check(&app_state).await;
    app_state.shutdown().await?;

    match health {
        Ok(health) => {
            println!("Health Check: {}", health.status);
            println!("  Players: {}", health.stats.players);
            println!("  Matches processed: {}", health.stats.matches_processed);
            for check in &health.checks {
                println!("  {}: {}", check.name, check.status);
            }

            if health.status == HealthStatus::Healthy {
                std::process::exit(0);
            } else {
                std::process::exit(1);
            }
        }
        Err(e) => {
            error!("Health check failed: {}", e);
            std::process::exit(1);
        }
    }
}

/// Wait for shutdown signals (SIGINT, SIGTERM)
async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C) signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}

/// Run periodic health checks
async fn health_check_task(app_state: Arc<AppState>) {
    let mut interval = tokio::time::interval(Duration::from_secs(30));

    while app_state.is_running().await {
        interval.tick().await;

        match HealthCheck::check(&app_state).await {
            Ok(health) => {
                info!(
                    "Health check: {} - {} players, {} matches, {} subscribers",
                    health.status,
                    health.stats.players,
                    health.stats.matches_processed,
                    health.stats.active_subscribers
                );
            }
            Err(e) => {
                warn!("Health check failed: {}", e);
            }
        }
    }
}

/// Display startup banner with service information
fn display_startup_banner(config: &AppConfig) {
    info!("🚀 Elo Ranker Service");
    info!("   Service: {}", config.service.name);
    info!("   Log level: {}", config.service.log_level);
    info!("   HTTP: {}", config.bind_address());
    info!(
        "   CORS origins: {}",
        config.service.cors_allowed_origins.join(", ")
    );
    info!("   K factor: {}", config.rating.k_factor);
    info!("   Default rating: {}", config.rating.default_rating);
    match config.storage.backend {
        StorageBackend::Memory => info!("   Storage: memory"),
        StorageBackend::File => info!("   Storage: file ({})", config.storage.path.display()),
    }
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}

/// Load and merge configuration from environment and CLI arguments
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    // Apply CLI overrides
    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }

    if args.debug {
        config.service.log_level = "debug".to_string();
    }

    if let Some(host) = &args.host {
        config.service.host = host.clone();
    }

    if let Some(http_port) = args.http_port {
        config.service.http_port = http_port;
    }

    if let Some(backend) = args.storage {
        config.storage.backend = backend;
    }

    if let Some(data_file) = &args.data_file {
        config.storage.path = data_file.clone();
    }

    if !args.cors_origins.is_empty() {
        config.service.cors_allowed_origins = args.cors_origins.clone();
    }

    validate_config(&config)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {:#}", e);
        std::process::exit(1);
    });

    // Initialize logging early (before any other operations)
    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    if let Some(config_path) = &args.config {
        info!("Loaded configuration from: {}", config_path.display());
    }

    if args.health_check {
        return perform_health_check(config).await;
    }

    if args.dry_run {
        info!("Configuration validation successful");
        display_startup_banner(&config);
        info!("Dry run completed - exiting without starting service");
        return Ok(());
    }

    display_startup_banner(&config);

    info!("Initializing service components...");
    let app_state = match AppState::new(config.clone()) {
        Ok(state) => Arc::new(state),
        Err(e) => {
            error!("Failed to initialize application: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = app_state.start().await {
        error!("Failed to start service: {}", e);
        std::process::exit(1);
    }

    let server = Arc::new(ApiServer::new(
        ApiServerConfig {
            host: config.service.host.clone(),
            port: config.service.http_port,
        },
        app_state.clone(),
    ));

    let mut server_task = {
        let server = server.clone();
        tokio::spawn(async move { server.start().await })
    };

    let health_task = {
        let app_state = app_state.clone();
        tokio::spawn(async move {
            health_check_task(app_state).await;
        })
    };

    info!("✅ Elo Ranker Service is running");
    info!("Press Ctrl+C to shutdown gracefully...");

    let mut server_finished = false;
    tokio::select! {
        _ = wait_for_shutdown_signal() => {
            info!("🛑 Shutdown signal received, beginning graceful shutdown...");
        }
        result = &mut server_task => {
            server_finished = true;
            match result {
                Ok(Ok(())) => warn!("API server exited unexpectedly"),
                Ok(Err(e)) => error!("API server failed: {:#}", e),
                Err(e) => error!("API server task panicked: {}", e),
            }
        }
    }

    health_task.abort();
    server.stop();

    // Open event streams hold the server open until the timeout
    if !server_finished {
        match tokio::time::timeout(config.shutdown_timeout(), &mut server_task).await {
            Ok(_) => info!("✅ API server drained"),
            Err(_) => {
                warn!("⚠️  Shutdown timeout exceeded, forcing exit");
                server_task.abort();
            }
        }
    }

    if let Err(e) = app_state.shutdown().await {
        error!("Error during shutdown: {}", e);
    }

    info!("🛑 Elo Ranker Service stopped");
    Ok(())
}
