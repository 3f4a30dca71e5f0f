//! Organization entity model.

use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::traits::{Entity, PaginatedEntity};

/// An organization owning accounts and assets.
///
/// `organization_id` is minted from the identity counter and grows
/// monotonically, but not contiguously.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Organization {
    /// Store-assigned document identity.
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    /// Unique numeric identifier.
    pub organization_id: i64,
    /// Unique display name.
    pub name: String,
    /// When the document was inserted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_on: Option<bson::DateTime>,
    /// Who inserted the document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}

impl Entity for Organization {
    const COLLECTION: &'static str = "organizations";
}

impl PaginatedEntity for Organization {
    const PAGINATED_FIELD: &'static str = "organizationId";
    const PAGINATED_ASCENDING: bool = true;
}
