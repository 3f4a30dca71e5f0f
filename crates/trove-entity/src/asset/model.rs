//! Asset entity model.

use bson::Document;
use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::traits::{Entity, PaginatedEntity};

/// An on-chain asset identified by its address.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Asset {
    /// Store-assigned document identity.
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    /// Unique address of the asset.
    pub address: String,
    /// Display title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Longer description, indexed for full-text search.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Address of the current owner.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    /// Free-form metadata attached by the issuer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Document>,
    /// When the document was inserted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_on: Option<bson::DateTime>,
    /// Who inserted the document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}

impl Asset {
    /// Create an asset with only its address set.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Self::default()
        }
    }
}

impl Entity for Asset {
    const COLLECTION: &'static str = "assets";
}

impl PaginatedEntity for Asset {
    const PAGINATED_FIELD: &'static str = "createdOn";
    const PAGINATED_ASCENDING: bool = false;
}
