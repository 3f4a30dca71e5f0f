//! Process-wide repository registry.
//!
//! The registry owns one instance of every repository and runs index
//! provisioning once, after the first successful connection, before any
//! repository is handed out.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::info;

use trove_core::error::AppError;
use trove_core::result::AppResult;

use crate::connection::DatabaseClient;
use crate::provisioning::IndexProvisioner;
use crate::repositories::{
    AccountRepository, AssetRepository, BundleRepository, EventRepository,
    IdentityCounterRepository, OrganizationRepository,
};

/// Every repository, sharing one database client.
#[derive(Debug, Clone)]
pub struct RepositoryRegistry {
    db: DatabaseClient,
    /// Event repository.
    pub events: Arc<EventRepository>,
    /// Asset repository.
    pub assets: Arc<AssetRepository>,
    /// Bundle repository.
    pub bundles: Arc<BundleRepository>,
    /// Account repository.
    pub accounts: Arc<AccountRepository>,
    /// Organization repository.
    pub organizations: Arc<OrganizationRepository>,
    /// Identity counter repository.
    pub counters: Arc<IdentityCounterRepository>,
    provisioned: Arc<OnceCell<()>>,
}

impl RepositoryRegistry {
    /// Build every repository without touching the store.
    pub fn new(db: DatabaseClient) -> AppResult<Self> {
        let counters = IdentityCounterRepository::new(db.clone());
        Ok(Self {
            events: Arc::new(EventRepository::new(db.clone())?),
            assets: Arc::new(AssetRepository::new(db.clone())?),
            bundles: Arc::new(BundleRepository::new(db.clone())?),
            accounts: Arc::new(AccountRepository::new(db.clone())?),
            organizations: Arc::new(OrganizationRepository::new(db.clone(), counters.clone())?),
            counters: Arc::new(counters),
            provisioned: Arc::new(OnceCell::new()),
            db,
        })
    }

    /// Connect, provision indexes and return the ready registry.
    pub async fn initialize(db: DatabaseClient) -> AppResult<Self> {
        let registry = Self::new(db)?;
        registry.provision().await?;
        Ok(registry)
    }

    /// Provision the indexes of every repository, once.
    ///
    /// Concurrent callers wait on the same run; a failed run is retried by
    /// the next call.
    pub async fn provision(&self) -> AppResult<()> {
        self.provisioned
            .get_or_try_init(|| async {
                self.db.connection().await?;
                for provisioner in self.provisioners() {
                    info!(
                        collection = provisioner.collection_name(),
                        "Provisioning indexes"
                    );
                    provisioner.provision_indexes().await?;
                }
                info!("Database initialization complete");
                Ok::<_, AppError>(())
            })
            .await?;
        Ok(())
    }

    /// Whether index provisioning has completed.
    pub fn is_provisioned(&self) -> bool {
        self.provisioned.initialized()
    }

    /// The shared database client.
    pub fn db(&self) -> &DatabaseClient {
        &self.db
    }

    fn provisioners(&self) -> [&dyn IndexProvisioner; 5] {
        [
            self.events.as_ref(),
            self.assets.as_ref(),
            self.bundles.as_ref(),
            self.accounts.as_ref(),
            self.organizations.as_ref(),
        ]
    }
}
