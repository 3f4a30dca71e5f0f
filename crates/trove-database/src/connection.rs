//! MongoDB client management.
//!
//! One [`DatabaseClient`] is shared by every repository in the process. It
//! connects lazily on first use; concurrent callers racing the first
//! connection share a single attempt, and a failed attempt is not cached
//! so the next call tries again.

use std::sync::Arc;
use std::time::Duration;

use mongodb::bson::doc;
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection, Database};
use tokio::sync::OnceCell;
use tracing::{error, info};

use trove_core::config::DatabaseConfig;
use trove_core::error::{AppError, ErrorKind};
use trove_core::result::AppResult;

/// An established connection to the Trove database.
#[derive(Debug, Clone)]
pub struct Connection {
    client: Client,
    database: Database,
}

impl Connection {
    /// Return the underlying driver client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Return the Trove database handle.
    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Return a typed handle to the named collection.
    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.database.collection(name)
    }
}

/// Lazily connected, process-wide database client.
#[derive(Debug, Clone)]
pub struct DatabaseClient {
    inner: Arc<ClientInner>,
}

#[derive(Debug)]
struct ClientInner {
    config: DatabaseConfig,
    connection: OnceCell<Connection>,
}

impl DatabaseClient {
    /// Create a client from configuration. No I/O happens until the first
    /// call to [`DatabaseClient::connection`].
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                config,
                connection: OnceCell::new(),
            }),
        }
    }

    /// Create a client and establish its connection immediately.
    pub async fn connect(config: DatabaseConfig) -> AppResult<Self> {
        let client = Self::new(config);
        client.connection().await?;
        Ok(client)
    }

    /// Return the shared connection, establishing it on first use.
    pub async fn connection(&self) -> AppResult<&Connection> {
        self.inner
            .connection
            .get_or_try_init(|| establish(&self.inner.config))
            .await
    }

    /// Whether the connection has been established.
    pub fn is_connected(&self) -> bool {
        self.inner.connection.initialized()
    }

    /// Return the configuration this client was built from.
    pub fn config(&self) -> &DatabaseConfig {
        &self.inner.config
    }

    /// Check database connectivity.
    pub async fn health_check(&self) -> AppResult<bool> {
        let connection = self.connection().await?;
        connection
            .client()
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .map(|reply| reply.get_f64("ok").map(|ok| ok == 1.0).unwrap_or(true))
            .map_err(|e| AppError::with_source(ErrorKind::Repository, "Health check failed", e))
    }

    /// Shut the driver down if a connection was ever established.
    pub async fn close(&self) {
        if let Some(connection) = self.inner.connection.get() {
            connection.client().clone().shutdown().await;
            info!("Database client closed");
        }
    }
}

async fn establish(config: &DatabaseConfig) -> AppResult<Connection> {
    info!(
        uri = %mask_password(&config.uri),
        database = %config.name,
        max_pool_size = config.max_pool_size,
        "Connecting to MongoDB"
    );

    let mut options = ClientOptions::parse(&config.uri).await.map_err(|e| {
        error!(uri = %mask_password(&config.uri), error = %e, "Invalid MongoDB URI");
        AppError::with_source(ErrorKind::Repository, "Invalid MongoDB connection URI", e)
    })?;
    options.app_name = Some(config.app_name.clone());
    options.max_pool_size = Some(config.max_pool_size);
    options.min_pool_size = Some(config.min_pool_size);
    options.connect_timeout = Some(Duration::from_secs(config.connect_timeout_seconds));
    options.server_selection_timeout =
        Some(Duration::from_secs(config.server_selection_timeout_seconds));

    let client = Client::with_options(options).map_err(|e| {
        AppError::with_source(ErrorKind::Repository, "Failed to create MongoDB client", e)
    })?;

    client
        .database("admin")
        .run_command(doc! { "ping": 1 })
        .await
        .map_err(|e| {
            error!(uri = %mask_password(&config.uri), error = %e, "MongoDB is unreachable");
            AppError::with_source(
                ErrorKind::Repository,
                format!("Failed to connect to database: {e}"),
                e,
            )
        })?;

    info!(database = %config.name, "Successfully connected to MongoDB");
    let database = client.database(&config.name);
    Ok(Connection { client, database })
}

/// Mask the password portion of a connection URI for safe logging.
pub fn mask_password(uri: &str) -> String {
    let scheme_end = uri.find("://").map(|p| p + 3).unwrap_or(0);
    let authority_end = uri[scheme_end..]
        .find('/')
        .map(|p| p + scheme_end)
        .unwrap_or(uri.len());
    if let Some(at_pos) = uri[..authority_end].rfind('@') {
        if let Some(colon_pos) = uri[scheme_end..at_pos].find(':') {
            let colon_pos = colon_pos + scheme_end;
            return format!("{}:****@{}", &uri[..colon_pos], &uri[at_pos + 1..]);
        }
    }
    uri.to_string()
}
