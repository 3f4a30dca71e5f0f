//! Identity counter documents.

pub mod model;

pub use model::IdentityCounter;
