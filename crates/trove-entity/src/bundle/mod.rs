//! Bundle domain entities.

pub mod model;

pub use model::Bundle;
