//! Shared test helpers for integration tests.

use uuid::Uuid;

use trove_core::config::DatabaseConfig;
use trove_database::{DatabaseClient, RepositoryRegistry};

/// Environment variable naming the MongoDB used by integration tests.
pub const TEST_URI_VAR: &str = "TROVE_TEST_MONGODB_URI";

/// Test context bound to a freshly provisioned, uniquely named database.
pub struct TestDb {
    /// Shared database client
    pub db: DatabaseClient,
    /// Initialized repositories
    pub repos: RepositoryRegistry,
}

impl TestDb {
    /// Create a test database, or `None` when no test MongoDB is configured.
    pub async fn new() -> Option<Self> {
        let Ok(uri) = std::env::var(TEST_URI_VAR) else {
            eprintln!("{TEST_URI_VAR} not set, skipping");
            return None;
        };

        let name = format!("trove_test_{}", Uuid::new_v4().simple());
        let db = DatabaseClient::new(DatabaseConfig::new(uri, name));
        let repos = RepositoryRegistry::initialize(db.clone())
            .await
            .expect("Failed to initialize test database");

        Some(Self { db, repos })
    }

    /// Drop the test database and close the client.
    pub async fn cleanup(self) {
        let connection = self.db.connection().await.expect("Not connected");
        connection
            .database()
            .drop()
            .await
            .expect("Failed to drop test database");
        self.db.close().await;
    }
}
