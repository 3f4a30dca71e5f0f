//! # trove-core
//!
//! Core crate for Trove. Contains configuration schemas, the API query
//! model, cursor pagination types, access levels, and the unified error
//! system.
//!
//! This crate has **no** internal dependencies on other Trove crates.

pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
