//! Organization repository implementation.

use std::ops::Deref;

use async_trait::async_trait;
use mongodb::bson::{self, doc};
use tracing::info;

use trove_core::result::AppResult;
use trove_core::types::ApiQuery;
use trove_entity::Organization;
use trove_entity::traits::Entity;

use crate::connection::DatabaseClient;
use crate::provisioning::{IndexProvisioner, unique_index};
use crate::repositories::base::BaseRepository;
use crate::repositories::counter::IdentityCounterRepository;

/// Counter minting organization ids.
pub const ORGANIZATION_ID_COUNTER: &str = "organizationId";

/// Amount each new organization id advances by.
pub const ORGANIZATION_ID_STEP: i64 = 9;

/// Repository for organizations, ordered by organization id.
#[derive(Debug, Clone)]
pub struct OrganizationRepository {
    base: BaseRepository<Organization>,
    counters: IdentityCounterRepository,
}

impl OrganizationRepository {
    /// Create a new organization repository minting ids from `counters`.
    pub fn new(db: DatabaseClient, counters: IdentityCounterRepository) -> AppResult<Self> {
        Ok(Self {
            base: BaseRepository::paginated(db)?,
            counters,
        })
    }

    /// Reserve the next organization id.
    pub async fn next_organization_id(&self) -> AppResult<i64> {
        self.counters
            .increment(ORGANIZATION_ID_COUNTER, ORGANIZATION_ID_STEP)
            .await
    }

    /// Create an organization under a newly minted id.
    ///
    /// The id is reserved before the insert, so a failed insert (for
    /// example a duplicate name) leaves a gap in the sequence.
    pub async fn create_organization(
        &self,
        name: &str,
        created_by: &str,
    ) -> AppResult<Organization> {
        let mut organization = Organization {
            organization_id: self.next_organization_id().await?,
            name: name.to_string(),
            created_on: Some(bson::DateTime::now()),
            created_by: Some(created_by.to_string()),
            ..Organization::default()
        };

        let result = self.base.create(&organization).await?;
        organization.id = result.inserted_id.as_object_id();
        info!(
            organization_id = organization.organization_id,
            name = %organization.name,
            "Organization created"
        );
        Ok(organization)
    }

    /// Find an organization by its unique name.
    pub async fn find_by_name(&self, name: &str) -> AppResult<Option<Organization>> {
        self.base
            .find_one(&ApiQuery::new(doc! { "name": name }))
            .await
    }
}

impl Deref for OrganizationRepository {
    type Target = BaseRepository<Organization>;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}

#[async_trait]
impl IndexProvisioner for OrganizationRepository {
    fn collection_name(&self) -> &'static str {
        Organization::COLLECTION
    }

    async fn provision_indexes(&self) -> AppResult<()> {
        self.base
            .ensure_indexes(vec![unique_index("organizationId"), unique_index("name")])
            .await
    }
}
