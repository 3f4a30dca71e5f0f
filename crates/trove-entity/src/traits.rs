//! Capability traits binding entity types to their collections.

use serde::Serialize;
use serde::de::DeserializeOwned;

use trove_core::types::AccessLevel;

/// A document type stored in its own collection.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + Unpin + 'static {
    /// Name of the collection holding documents of this type.
    const COLLECTION: &'static str;

    /// Fields a caller at `level` is not allowed to read.
    fn hidden_fields(_level: AccessLevel) -> &'static [&'static str] {
        &[]
    }
}

/// An entity that can be listed with cursor pagination.
///
/// Neither constant has a default: every paginated entity states its own
/// sort key and direction.
pub trait PaginatedEntity: Entity {
    /// Field used as the cursor and sort key.
    const PAGINATED_FIELD: &'static str;
    /// Whether pages run in ascending order of [`Self::PAGINATED_FIELD`].
    const PAGINATED_ASCENDING: bool;
}
