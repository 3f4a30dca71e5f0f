//! Account repository implementation.

use std::ops::Deref;

use async_trait::async_trait;
use mongodb::bson::doc;

use trove_core::result::AppResult;
use trove_core::types::{AccessLevel, ApiQuery};
use trove_entity::Account;
use trove_entity::traits::Entity;

use crate::connection::DatabaseClient;
use crate::provisioning::{IndexProvisioner, unique_index};
use crate::repositories::base::BaseRepository;

/// Repository for accounts, ordered by address.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    base: BaseRepository<Account>,
}

impl AccountRepository {
    /// Create a new account repository.
    pub fn new(db: DatabaseClient) -> AppResult<Self> {
        Ok(Self {
            base: BaseRepository::paginated(db)?,
        })
    }

    /// Find an account by address, as seen by a caller at `level`.
    pub async fn find_by_address(
        &self,
        address: &str,
        level: AccessLevel,
    ) -> AppResult<Option<Account>> {
        let mut query = ApiQuery::new(doc! { "address": address });
        query.access_level = level;
        self.base.find_one(&query).await
    }
}

impl Deref for AccountRepository {
    type Target = BaseRepository<Account>;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}

#[async_trait]
impl IndexProvisioner for AccountRepository {
    fn collection_name(&self) -> &'static str {
        Account::COLLECTION
    }

    async fn provision_indexes(&self) -> AppResult<()> {
        self.base.ensure_indexes(vec![unique_index("address")]).await
    }
}
