//! Sorting types for paginated queries.

use serde::{Deserialize, Serialize};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Ascending order.
    Asc,
    /// Descending order.
    Desc,
}

impl Default for SortDirection {
    fn default() -> Self {
        Self::Asc
    }
}

impl SortDirection {
    /// Map an `ascending` flag onto a direction.
    pub fn from_ascending(ascending: bool) -> Self {
        if ascending { Self::Asc } else { Self::Desc }
    }

    /// Return the value MongoDB expects in a sort specification.
    pub fn as_order(&self) -> i32 {
        match self {
            Self::Asc => 1,
            Self::Desc => -1,
        }
    }

    /// Return the opposite direction.
    pub fn reversed(&self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    /// Comparison operator selecting documents that come *after* a
    /// position when scanning in this direction.
    pub fn after_operator(&self) -> &'static str {
        match self {
            Self::Asc => "$gt",
            Self::Desc => "$lt",
        }
    }
}
