//! Query normalization limits.

use serde::{Deserialize, Serialize};

/// Bounds applied when normalizing incoming queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Page size used when the caller does not ask for one.
    #[serde(default = "default_limit")]
    pub default_limit: u32,
    /// Largest page size a caller may request.
    #[serde(default = "default_max_limit")]
    pub max_limit: u32,
}

impl QueryConfig {
    /// Clamp a requested page size into `1..=max_limit`.
    pub fn clamp_limit(&self, requested: Option<u32>) -> u32 {
        let max = self.max_limit.max(1);
        requested.unwrap_or(self.default_limit).clamp(1, max)
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_limit: default_max_limit(),
        }
    }
}

fn default_limit() -> u32 {
    25
}

fn default_max_limit() -> u32 {
    1000
}
