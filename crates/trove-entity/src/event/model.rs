//! Event entity model.

use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::traits::{Entity, PaginatedEntity};

/// Something that happened to an asset, newest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Event {
    /// Store-assigned document identity.
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    /// Unique natural identifier of the event.
    pub event_id: String,
    /// Address of the asset the event belongs to.
    pub asset: String,
    /// Event kind, e.g. `"mint"` or `"transfer"`.
    pub kind: String,
    /// Short human-readable title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Longer description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// When the event happened.
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub timestamp: DateTime<Utc>,
    /// When the document was inserted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_on: Option<bson::DateTime>,
    /// Who inserted the document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}

impl Event {
    /// Create a new event for `asset`.
    pub fn new(
        event_id: impl Into<String>,
        asset: impl Into<String>,
        kind: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            asset: asset.into(),
            kind: kind.into(),
            timestamp,
            ..Self::default()
        }
    }
}

impl Entity for Event {
    const COLLECTION: &'static str = "events";
}

impl PaginatedEntity for Event {
    const PAGINATED_FIELD: &'static str = "timestamp";
    const PAGINATED_ASCENDING: bool = false;
}
