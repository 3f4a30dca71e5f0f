//! Post-connection index provisioning.

use async_trait::async_trait;
use mongodb::IndexModel;
use mongodb::bson::{Document, doc};
use mongodb::options::IndexOptions;

use trove_core::result::AppResult;

/// A repository that owns indexes on its collection.
#[async_trait]
pub trait IndexProvisioner: Send + Sync {
    /// Collection the indexes belong to.
    fn collection_name(&self) -> &'static str;

    /// Create every index the collection needs. Must be idempotent.
    async fn provision_indexes(&self) -> AppResult<()>;
}

/// Unique single-field ascending index.
pub fn unique_index(field: &str) -> IndexModel {
    IndexModel::builder()
        .keys(keys(field))
        .options(
            IndexOptions::builder()
                .unique(true)
                .name(format!("{field}_unique"))
                .build(),
        )
        .build()
}

/// Plain single-field ascending index.
pub fn ascending_index(field: &str) -> IndexModel {
    IndexModel::builder()
        .keys(keys(field))
        .options(IndexOptions::builder().name(format!("{field}_asc")).build())
        .build()
}

/// Compound text index over `fields`. A collection holds at most one.
pub fn text_index(fields: &[&str]) -> IndexModel {
    let mut keys = Document::new();
    for field in fields {
        keys.insert(*field, "text");
    }
    IndexModel::builder()
        .keys(keys)
        .options(IndexOptions::builder().name("text_search".to_string()).build())
        .build()
}

fn keys(field: &str) -> Document {
    let mut keys = doc! {};
    keys.insert(field, 1);
    keys
}
