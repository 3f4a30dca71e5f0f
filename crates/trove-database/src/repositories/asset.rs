//! Asset repository implementation.

use std::ops::Deref;

use async_trait::async_trait;
use mongodb::bson::doc;

use trove_core::result::AppResult;
use trove_core::types::ApiQuery;
use trove_entity::Asset;
use trove_entity::traits::Entity;

use crate::connection::DatabaseClient;
use crate::provisioning::{IndexProvisioner, text_index, unique_index};
use crate::repositories::base::BaseRepository;

/// Repository for assets, most recently created first.
#[derive(Debug, Clone)]
pub struct AssetRepository {
    base: BaseRepository<Asset>,
}

impl AssetRepository {
    /// Create a new asset repository.
    pub fn new(db: DatabaseClient) -> AppResult<Self> {
        Ok(Self {
            base: BaseRepository::paginated(db)?,
        })
    }

    /// Find an asset by address.
    pub async fn find_by_address(&self, address: &str) -> AppResult<Option<Asset>> {
        self.base
            .find_one(&ApiQuery::new(doc! { "address": address }))
            .await
    }

    /// Write `asset` under its address, inserting it if no asset holds that
    /// address yet.
    pub async fn upsert_by_address(&self, asset: &Asset) -> AppResult<Option<Asset>> {
        self.base
            .update(doc! { "address": asset.address.as_str() }, asset, true)
            .await
    }
}

impl Deref for AssetRepository {
    type Target = BaseRepository<Asset>;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}

#[async_trait]
impl IndexProvisioner for AssetRepository {
    fn collection_name(&self) -> &'static str {
        Asset::COLLECTION
    }

    async fn provision_indexes(&self) -> AppResult<()> {
        self.base
            .ensure_indexes(vec![
                unique_index("address"),
                text_index(&["title", "description"]),
            ])
            .await
    }
}
