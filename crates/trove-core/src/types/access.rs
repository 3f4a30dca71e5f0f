//! Caller access levels.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Integer access level associated with the caller of a query.
///
/// Levels are ordered: a caller sees everything visible at its own level
/// and below.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessLevel(pub i32);

impl AccessLevel {
    /// Unauthenticated caller.
    pub const ANONYMOUS: Self = Self(0);
    /// Authenticated member.
    pub const MEMBER: Self = Self(1);
    /// Administrator.
    pub const ADMIN: Self = Self(2);

    /// Whether this level grants at least `required`.
    pub fn at_least(self, required: AccessLevel) -> bool {
        self >= required
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for AccessLevel {
    fn from(level: i32) -> Self {
        Self(level)
    }
}
