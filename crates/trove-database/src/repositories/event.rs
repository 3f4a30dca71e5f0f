//! Event repository implementation.

use std::ops::Deref;

use async_trait::async_trait;
use mongodb::bson::doc;

use trove_core::result::AppResult;
use trove_core::types::ApiQuery;
use trove_entity::Event;
use trove_entity::traits::Entity;

use crate::connection::DatabaseClient;
use crate::provisioning::{IndexProvisioner, ascending_index, text_index, unique_index};
use crate::repositories::base::BaseRepository;

/// Repository for asset events, newest first.
#[derive(Debug, Clone)]
pub struct EventRepository {
    base: BaseRepository<Event>,
}

impl EventRepository {
    /// Create a new event repository.
    pub fn new(db: DatabaseClient) -> AppResult<Self> {
        Ok(Self {
            base: BaseRepository::paginated(db)?,
        })
    }

    /// Find an event by its external identifier.
    pub async fn find_by_event_id(&self, event_id: &str) -> AppResult<Option<Event>> {
        self.base
            .find_one(&ApiQuery::new(doc! { "eventId": event_id }))
            .await
    }

    /// Count events recorded against an asset.
    pub async fn count_for_asset(&self, asset: &str) -> AppResult<u64> {
        self.base.count(doc! { "asset": asset }).await
    }
}

impl Deref for EventRepository {
    type Target = BaseRepository<Event>;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}

#[async_trait]
impl IndexProvisioner for EventRepository {
    fn collection_name(&self) -> &'static str {
        Event::COLLECTION
    }

    async fn provision_indexes(&self) -> AppResult<()> {
        self.base
            .ensure_indexes(vec![
                unique_index("eventId"),
                ascending_index("asset"),
                text_index(&["title", "description"]),
            ])
            .await
    }
}
