//! Bundle repository implementation.

use std::ops::Deref;

use async_trait::async_trait;
use mongodb::bson::{self, doc};
use tracing::info;

use trove_core::result::AppResult;
use trove_core::types::{ApiQuery, PagedResult};
use trove_entity::Bundle;
use trove_entity::traits::Entity;

use crate::connection::DatabaseClient;
use crate::provisioning::{IndexProvisioner, ascending_index, unique_index};
use crate::repositories::base::BaseRepository;

/// Repository for asset bundles.
#[derive(Debug, Clone)]
pub struct BundleRepository {
    base: BaseRepository<Bundle>,
}

impl BundleRepository {
    /// Create a new bundle repository.
    pub fn new(db: DatabaseClient) -> AppResult<Self> {
        Ok(Self {
            base: BaseRepository::paginated(db)?,
        })
    }

    /// Create a bundle of `assets` under a freshly minted bundle id.
    pub async fn create_bundle(
        &self,
        name: &str,
        assets: Vec<String>,
        created_by: &str,
    ) -> AppResult<Bundle> {
        let mut bundle = Bundle::new(name, assets);
        bundle.created_on = Some(bson::DateTime::now());
        bundle.created_by = Some(created_by.to_string());

        let result = self.base.create(&bundle).await?;
        bundle.id = result.inserted_id.as_object_id();
        info!(bundle_id = %bundle.bundle_id, assets = bundle.assets.len(), "Bundle created");
        Ok(bundle)
    }

    /// Page through bundles containing the asset at `address`.
    pub async fn find_containing_asset(
        &self,
        address: &str,
        query: &ApiQuery,
    ) -> AppResult<PagedResult<Bundle>> {
        let mut scoped = query.clone();
        scoped.query.insert("assets", address);
        self.base.find(&scoped).await
    }
}

impl Deref for BundleRepository {
    type Target = BaseRepository<Bundle>;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}

#[async_trait]
impl IndexProvisioner for BundleRepository {
    fn collection_name(&self) -> &'static str {
        Bundle::COLLECTION
    }

    async fn provision_indexes(&self) -> AppResult<()> {
        self.base
            .ensure_indexes(vec![unique_index("bundleId"), ascending_index("assets")])
            .await
    }
}
