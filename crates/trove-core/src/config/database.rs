//! Database configuration.

use serde::{Deserialize, Serialize};

/// MongoDB client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// MongoDB connection URI.
    pub uri: String,
    /// Name of the database holding every Trove collection.
    #[serde(default = "default_name")]
    pub name: String,
    /// Application name reported to the server in the handshake.
    #[serde(default = "default_app_name")]
    pub app_name: String,
    /// Maximum number of pooled connections held by the driver.
    #[serde(default = "default_max_pool_size")]
    pub max_pool_size: u32,
    /// Minimum number of pooled connections held by the driver.
    #[serde(default = "default_min_pool_size")]
    pub min_pool_size: u32,
    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
    /// Server selection timeout in seconds.
    #[serde(default = "default_server_selection_timeout")]
    pub server_selection_timeout_seconds: u64,
}

impl DatabaseConfig {
    /// Create a configuration for the given URI and database name, keeping
    /// every other setting at its default.
    pub fn new(uri: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            name: name.into(),
            app_name: default_app_name(),
            max_pool_size: default_max_pool_size(),
            min_pool_size: default_min_pool_size(),
            connect_timeout_seconds: default_connect_timeout(),
            server_selection_timeout_seconds: default_server_selection_timeout(),
        }
    }
}

fn default_name() -> String {
    "trove".to_string()
}

fn default_app_name() -> String {
    "trove-server".to_string()
}

fn default_max_pool_size() -> u32 {
    20
}

fn default_min_pool_size() -> u32 {
    0
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_server_selection_timeout() -> u64 {
    30
}
