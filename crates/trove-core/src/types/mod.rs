//! Core type definitions used across the Trove workspace.

pub mod access;
pub mod cursor;
pub mod pagination;
pub mod query;
pub mod sorting;

pub use access::AccessLevel;
pub use cursor::{CursorPosition, CursorToken};
pub use pagination::PagedResult;
pub use query::{ApiQuery, ApiQueryBuilder, PageCursor, QueryParams};
pub use sorting::SortDirection;
