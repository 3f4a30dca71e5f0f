//! Trove server
//!
//! Boots the data layer: loads configuration, connects to MongoDB,
//! provisions indexes and holds the connection until shutdown.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use trove_core::config::{AppConfig, LogFormat, LoggingConfig};
use trove_core::error::AppError;
use trove_database::{DatabaseClient, RepositoryRegistry, mask_password};

#[tokio::main]
async fn main() {
    let env = std::env::var("TROVE_ENV").unwrap_or_else(|_| "development".to_string());
    let config = match AppConfig::load(&env).and_then(|config| {
        init_logging(&config.logging)?;
        Ok(config)
    }) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to start: {e}");
            std::process::exit(1);
        }
    };
    tracing::info!(env = %env, "Configuration loaded");

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

/// Install the global subscriber. `RUST_LOG` overrides the configured level.
fn init_logging(config: &LoggingConfig) -> Result<(), AppError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| {
            AppError::configuration(format!("Invalid log filter '{}': {e}", config.level))
        })?;

    let output: Box<dyn Layer<Registry> + Send + Sync> = match config.format {
        LogFormat::Json => fmt::layer().json().flatten_event(true).boxed(),
        LogFormat::Pretty => fmt::layer().pretty().boxed(),
        LogFormat::Compact => fmt::layer().compact().boxed(),
    };

    tracing_subscriber::registry()
        .with(output.with_filter(filter))
        .try_init()
        .map_err(|e| AppError::configuration(format!("Failed to install log subscriber: {e}")))
}

async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Trove v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        uri = %mask_password(&config.database.uri),
        database = %config.database.name,
        default_limit = config.query.default_limit,
        max_limit = config.query.max_limit,
        "Initializing data layer"
    );

    let db = DatabaseClient::new(config.database);
    let registry = RepositoryRegistry::initialize(db.clone()).await?;

    if db.health_check().await? {
        tracing::info!("Database healthy");
    } else {
        tracing::warn!("Database ping did not report ok");
    }
    tracing::info!(
        collections = ?[
            registry.events.collection_name(),
            registry.assets.collection_name(),
            registry.bundles.collection_name(),
            registry.accounts.collection_name(),
            registry.organizations.collection_name(),
        ],
        "Repositories ready"
    );

    shutdown_signal().await;
    tracing::info!("Shutdown signal received");

    db.close().await;
    tracing::info!("Trove stopped");
    Ok(())
}

/// Resolve on Ctrl+C, or SIGTERM on unix.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    result = tokio::signal::ctrl_c() => log_signal_error(result),
                    _ = terminate.recv() => {}
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM unavailable, waiting for Ctrl+C only");
                log_signal_error(tokio::signal::ctrl_c().await);
            }
        }
    }

    #[cfg(not(unix))]
    log_signal_error(tokio::signal::ctrl_c().await);
}

fn log_signal_error(result: std::io::Result<()>) {
    if let Err(e) = result {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
