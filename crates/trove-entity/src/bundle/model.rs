//! Bundle entity model.

use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::traits::{Entity, PaginatedEntity};

/// A named group of assets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Bundle {
    /// Store-assigned document identity.
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    /// Unique natural identifier (UUID string).
    pub bundle_id: String,
    /// Display name.
    pub name: String,
    /// Addresses of the assets in the bundle.
    pub assets: Vec<String>,
    /// When the document was inserted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_on: Option<bson::DateTime>,
    /// Who inserted the document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}

impl Bundle {
    /// Create a bundle with a freshly minted identifier.
    pub fn new(name: impl Into<String>, assets: Vec<String>) -> Self {
        Self {
            bundle_id: Uuid::new_v4().to_string(),
            name: name.into(),
            assets,
            ..Self::default()
        }
    }

    /// Whether the bundle contains the asset at `address`.
    pub fn contains(&self, address: &str) -> bool {
        self.assets.iter().any(|a| a == address)
    }
}

impl Entity for Bundle {
    const COLLECTION: &'static str = "bundles";
}

impl PaginatedEntity for Bundle {
    const PAGINATED_FIELD: &'static str = "createdOn";
    const PAGINATED_ASCENDING: bool = false;
}
