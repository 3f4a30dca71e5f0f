//! Account entity model.

use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use trove_core::types::AccessLevel;

use crate::traits::{Entity, PaginatedEntity};

const ADMIN_ONLY_FIELDS: &[&str] = &["email"];

/// A wallet account known to the API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Account {
    /// Store-assigned document identity.
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    /// Unique wallet address.
    pub address: String,
    /// Display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Contact email, visible to administrators only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// When the document was inserted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_on: Option<bson::DateTime>,
    /// Who inserted the document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}

impl Account {
    /// Create an account with only its address set.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Self::default()
        }
    }
}

impl Entity for Account {
    const COLLECTION: &'static str = "accounts";

    fn hidden_fields(level: AccessLevel) -> &'static [&'static str] {
        if level.at_least(AccessLevel::ADMIN) {
            &[]
        } else {
            ADMIN_ONLY_FIELDS
        }
    }
}

impl PaginatedEntity for Account {
    const PAGINATED_FIELD: &'static str = "address";
    const PAGINATED_ASCENDING: bool = true;
}
