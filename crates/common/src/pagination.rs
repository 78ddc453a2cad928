//! Offset/limit pagination shared by list queries.

use serde::Deserialize;

/// A `skip`/`limit` window over an ordered result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub skip: usize,
    #[serde(default = "Page::default_limit")]
    pub limit: usize,
}

impl Page {
    pub const DEFAULT_LIMIT: usize = 100;
    pub const MAX_LIMIT: usize = 1000;

    /// Creates a page, clamping `limit` to [`Page::MAX_LIMIT`].
    pub fn new(skip: usize, limit: usize) -> Self {
        Self {
            skip,
            limit: limit.min(Self::MAX_LIMIT),
        }
    }

    /// Returns a copy with `limit` clamped to [`Page::MAX_LIMIT`].
    pub fn clamped(self) -> Self {
        Self::new(self.skip, self.limit)
    }

    fn default_limit() -> usize {
        Self::DEFAULT_LIMIT
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}
