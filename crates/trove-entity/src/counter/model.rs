//! Identity counter model.

use serde::{Deserialize, Serialize};

use crate::traits::Entity;

/// One named, monotonically increasing counter.
///
/// Counters are never listed, so this entity is deliberately not
/// paginated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityCounter {
    /// Counter name, stored as the document identity.
    #[serde(rename = "_id")]
    pub name: String,
    /// Last value handed out.
    pub value: i64,
}

impl IdentityCounter {
    /// Field holding the counter value.
    pub const VALUE_FIELD: &'static str = "value";
}

impl Entity for IdentityCounter {
    const COLLECTION: &'static str = "identityCounter";
}
