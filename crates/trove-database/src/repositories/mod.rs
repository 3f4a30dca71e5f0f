//! Repository implementations for all Trove entities.

pub mod account;
pub mod asset;
pub mod base;
pub mod bundle;
pub mod counter;
pub mod event;
pub mod organization;
pub mod paging;

pub use account::AccountRepository;
pub use asset::AssetRepository;
pub use base::BaseRepository;
pub use bundle::BundleRepository;
pub use counter::IdentityCounterRepository;
pub use event::EventRepository;
pub use organization::{ORGANIZATION_ID_STEP, OrganizationRepository};
pub use paging::PaginationPolicy;
