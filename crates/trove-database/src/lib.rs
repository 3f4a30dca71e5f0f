//! # trove-database
//!
//! MongoDB client management, the generic paginated repository and the
//! concrete repositories for every Trove entity.

pub mod connection;
pub mod provisioning;
pub mod registry;
pub mod repositories;

pub use connection::{DatabaseClient, mask_password};
pub use provisioning::IndexProvisioner;
pub use registry::RepositoryRegistry;
pub use repositories::{BaseRepository, PaginationPolicy};
