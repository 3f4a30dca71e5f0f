//! Identity counter repository implementation.

use mongodb::bson::doc;
use tracing::debug;

use trove_core::error::AppError;
use trove_core::result::AppResult;
use trove_core::types::ApiQuery;
use trove_entity::IdentityCounter;

use crate::connection::DatabaseClient;
use crate::repositories::base::BaseRepository;

/// Repository for named counters used to mint numeric identifiers.
#[derive(Debug, Clone)]
pub struct IdentityCounterRepository {
    base: BaseRepository<IdentityCounter>,
}

impl IdentityCounterRepository {
    /// Create a new counter repository.
    pub fn new(db: DatabaseClient) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Atomically add `step` to the counter `name` and return the new
    /// value. A missing counter starts from zero.
    pub async fn increment(&self, name: &str, step: i64) -> AppResult<i64> {
        if step <= 0 {
            return Err(AppError::developer(format!(
                "Counter '{name}' must advance by a positive step, got {step}"
            )));
        }
        let counter = self
            .base
            .increment(doc! { "_id": name }, IdentityCounter::VALUE_FIELD, step)
            .await?;
        debug!(counter = name, value = counter.value, "Counter advanced");
        Ok(counter.value)
    }

    /// Current value of the counter `name`, zero if it was never advanced.
    pub async fn current(&self, name: &str) -> AppResult<i64> {
        let counter = self
            .base
            .find_one(&ApiQuery::new(doc! { "_id": name }))
            .await?;
        Ok(counter.map(|c| c.value).unwrap_or(0))
    }
}
