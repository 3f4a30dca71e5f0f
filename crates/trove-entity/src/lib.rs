//! # trove-entity
//!
//! Document models for Trove. Every struct in this crate represents a
//! document stored in one MongoDB collection. All entities derive `Debug`,
//! `Clone`, `Default`, `Serialize` and `Deserialize`, use camelCase field
//! names on the wire, and default any field a projection left out.

pub mod account;
pub mod asset;
pub mod bundle;
pub mod counter;
pub mod event;
pub mod organization;
pub mod traits;

pub use account::Account;
pub use asset::Asset;
pub use bundle::Bundle;
pub use counter::IdentityCounter;
pub use event::Event;
pub use organization::Organization;
pub use traits::{Entity, PaginatedEntity};

/// Document field names shared by every entity.
pub mod fields {
    /// Document identity.
    pub const ID: &str = "_id";
    /// When the document was first inserted.
    pub const CREATED_ON: &str = "createdOn";
    /// Who first inserted the document.
    pub const CREATED_BY: &str = "createdBy";
}
